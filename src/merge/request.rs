use std::path::{Path, PathBuf};

use crate::error::MergeError;
use crate::library::{AudioFile, MediaProbe};

/// Output name for a mixdown of `a` and `b`: `merged_<a>_<b>.mp3`.
pub fn merged_file_name(a: &AudioFile, b: &AudioFile) -> String {
    format!("merged_{}_{}.mp3", a.name, b.name)
}

/// A validated pair of sources plus the deterministic output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub source_a: AudioFile,
    pub source_b: AudioFile,
    pub output: PathBuf,
}

impl MergeRequest {
    /// Both sources must be selected and exist on disk.
    pub fn new(
        a: Option<&AudioFile>,
        b: Option<&AudioFile>,
        merged_dir: &Path,
    ) -> Result<Self, MergeError> {
        let (Some(a), Some(b)) = (a, b) else {
            return Err(MergeError::InvalidInput(
                "choose one file from each list".to_string(),
            ));
        };

        for src in [a, b] {
            if !MediaProbe::exists(&src.path) {
                return Err(MergeError::InvalidInput(format!(
                    "{} does not exist",
                    src.path.display()
                )));
            }
        }

        Ok(Self {
            output: merged_dir.join(merged_file_name(a, b)),
            source_a: a.clone(),
            source_b: b.clone(),
        })
    }
}
