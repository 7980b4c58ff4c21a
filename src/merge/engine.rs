use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

use crate::error::MergeError;
use crate::library::{AudioFile, Category, ensure};

use super::request::MergeRequest;
use super::transcoder::Transcoder;

/// Mix both inputs' first audio streams; output lasts as long as the longer
/// input, with the shorter one padded by silence.
const MIX_FILTER: &str = "[0:0][1:0]amix=inputs=2:duration=longest";

/// `ffmpeg` arguments for mixing `request`'s two sources into its output.
pub fn mix_args(request: &MergeRequest, codec: &str) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        request.source_a.path.clone().into_os_string(),
        "-i".into(),
        request.source_b.path.clone().into_os_string(),
        "-filter_complex".into(),
        MIX_FILTER.into(),
        "-c:a".into(),
        codec.into(),
        request.output.clone().into_os_string(),
    ]
}

/// `ffmpeg` arguments for re-encoding a single file.
pub fn encode_args(input: &Path, output: &Path, codec: &str) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        input.as_os_str().to_owned(),
        "-c:a".into(),
        codec.into(),
        output.as_os_str().to_owned(),
    ]
}

/// Produces mixed tracks in the merged directory.
///
/// `merge` blocks for as long as the transcode takes; callers run it off the
/// UI thread. Two runs for the same pair write the same path, last one wins.
pub struct MergeEngine<T> {
    merged_dir: PathBuf,
    codec: String,
    transcoder: T,
}

impl<T: Transcoder> MergeEngine<T> {
    pub fn new(merged_dir: impl Into<PathBuf>, codec: impl Into<String>, transcoder: T) -> Self {
        Self {
            merged_dir: merged_dir.into(),
            codec: codec.into(),
            transcoder,
        }
    }

    pub fn merged_dir(&self) -> &Path {
        &self.merged_dir
    }

    /// Mix `a` with `b`. Invalid input fails before any process is started.
    pub fn merge(
        &self,
        a: Option<&AudioFile>,
        b: Option<&AudioFile>,
    ) -> Result<AudioFile, MergeError> {
        let request = MergeRequest::new(a, b, &self.merged_dir)?;
        self.run(&request)
    }

    pub fn run(&self, request: &MergeRequest) -> Result<AudioFile, MergeError> {
        ensure(&self.merged_dir)?;

        info!(
            a = %request.source_a.path.display(),
            b = %request.source_b.path.display(),
            output = %request.output.display(),
            "merging"
        );
        let started = Instant::now();

        match self.transcoder.execute(&mix_args(request, &self.codec))? {
            Some(0) => {
                info!(elapsed = ?started.elapsed(), "merge finished");
                Ok(AudioFile::new(request.output.clone(), Category::Merged))
            }
            code => {
                warn!(?code, "merge failed");
                Err(MergeError::ProcessFailure(code))
            }
        }
    }

    /// Re-encode `input` into `output` using the configured codec.
    pub fn encode(&self, input: &Path, output: &Path) -> Result<(), MergeError> {
        match self
            .transcoder
            .execute(&encode_args(input, output, &self.codec))?
        {
            Some(0) => Ok(()),
            code => Err(MergeError::ProcessFailure(code)),
        }
    }
}
