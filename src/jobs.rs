//! Background work for the UI thread.
//!
//! Network calls, downloads, merges, recording encodes and file probes each
//! run on their own thread and report back through one channel that the event loop
//! drains every tick.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::error::{DownloadError, MergeError, NetworkError, RecordError};
use crate::library::{AudioFile, MediaProbe, ProbeInfo};
use crate::merge::{MergeEngine, Transcoder};
use crate::record::PendingRecording;
use crate::search::{CancelToken, FileInfo, Progress, SearchClient, SearchHit};

/// Progress is forwarded at most this often, in bytes, when the total is unknown.
const PROGRESS_STEP: u64 = 64 * 1024;

#[derive(Debug)]
pub enum JobEvent {
    Search {
        query: String,
        result: Result<Vec<SearchHit>, NetworkError>,
    },
    FileInfo {
        title: String,
        result: Result<Option<FileInfo>, NetworkError>,
    },
    Preview {
        info: FileInfo,
        result: Result<Vec<u8>, NetworkError>,
    },
    DownloadProgress(Progress),
    Download(Result<AudioFile, DownloadError>),
    Merge(Result<AudioFile, MergeError>),
    Recorded(Result<AudioFile, RecordError>),
    Probe {
        file: AudioFile,
        result: io::Result<ProbeInfo>,
    },
}

pub struct Jobs {
    tx: Sender<JobEvent>,
    rx: Receiver<JobEvent>,
}

impl Default for Jobs {
    fn default() -> Self {
        Self::new()
    }
}

impl Jobs {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Everything that finished since the last call.
    pub fn drain(&self) -> Vec<JobEvent> {
        self.rx.try_iter().collect()
    }

    #[cfg(test)]
    pub fn wait(&self, timeout: std::time::Duration) -> Option<JobEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    fn spawn(&self, work: impl FnOnce() -> JobEvent + Send + 'static) {
        let tx = self.tx.clone();
        thread::spawn(move || {
            let _ = tx.send(work());
        });
    }

    pub fn search(&self, client: &SearchClient, query: String) {
        let client = client.clone();
        self.spawn(move || {
            let result = client.search(&query);
            JobEvent::Search { query, result }
        });
    }

    pub fn file_info(&self, client: &SearchClient, title: String) {
        let client = client.clone();
        self.spawn(move || {
            let result = client.resolve_download_url(&title);
            JobEvent::FileInfo { title, result }
        });
    }

    pub fn preview(&self, client: &SearchClient, info: FileInfo) {
        let client = client.clone();
        self.spawn(move || {
            let result = client.fetch_bytes(&info.url);
            JobEvent::Preview { info, result }
        });
    }

    pub fn download(&self, client: &SearchClient, url: String, dest: PathBuf, cancel: CancelToken) {
        let client = client.clone();
        let tx = self.tx.clone();
        self.spawn(move || {
            let mut last: Option<(u64, Option<u8>)> = None;
            let on_progress = |p: Progress| {
                let step = (p.downloaded / PROGRESS_STEP, p.percent());
                if last != Some(step) {
                    last = Some(step);
                    let _ = tx.send(JobEvent::DownloadProgress(p));
                }
            };
            JobEvent::Download(client.download(&url, &dest, on_progress, &cancel))
        });
    }

    pub fn merge<T: Transcoder + 'static>(
        &self,
        engine: &Arc<MergeEngine<T>>,
        a: Option<AudioFile>,
        b: Option<AudioFile>,
    ) {
        let engine = engine.clone();
        self.spawn(move || JobEvent::Merge(engine.merge(a.as_ref(), b.as_ref())));
    }

    /// Read size and duration of `file`. Parsing the container can take a
    /// while for long files.
    pub fn probe(&self, file: AudioFile) {
        self.spawn(move || {
            let result = MediaProbe::probe(&file.path);
            JobEvent::Probe { file, result }
        });
    }

    pub fn encode_recording<T: Transcoder + 'static>(
        &self,
        engine: &Arc<MergeEngine<T>>,
        pending: PendingRecording,
    ) {
        let engine = engine.clone();
        self.spawn(move || JobEvent::Recorded(pending.encode(&engine)));
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::fs;
    use std::io;
    use std::time::Duration;

    use tempfile::tempdir;

    use super::*;
    use crate::library::Category;
    use crate::record::capture_path;

    /// Writes its last argument as the output file and exits 0.
    struct TouchOutput;

    impl Transcoder for TouchOutput {
        fn execute(&self, args: &[OsString]) -> io::Result<Option<i32>> {
            if let Some(out) = args.last() {
                fs::write(out, b"mp3")?;
            }
            Ok(Some(0))
        }
    }

    #[test]
    fn merge_result_comes_back_over_the_channel() {
        let dir = tempdir().unwrap();
        let a = AudioFile::new(dir.path().join("voice.mp3"), Category::Recorded);
        let b = AudioFile::new(dir.path().join("song.mp3"), Category::Downloaded);
        fs::write(&a.path, b"a").unwrap();
        fs::write(&b.path, b"b").unwrap();

        let engine = Arc::new(MergeEngine::new(dir.path().join("merged"), "libmp3lame", TouchOutput));
        let jobs = Jobs::new();
        jobs.merge(&engine, Some(a), Some(b));

        match jobs.wait(Duration::from_secs(5)) {
            Some(JobEvent::Merge(Ok(file))) => {
                assert_eq!(file.file_name(), "merged_voice_song.mp3");
                assert!(file.path.exists());
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(jobs.drain().is_empty());
    }

    #[test]
    fn merge_without_sources_reports_invalid_input() {
        let dir = tempdir().unwrap();
        let engine = Arc::new(MergeEngine::new(dir.path(), "libmp3lame", TouchOutput));
        let jobs = Jobs::new();
        jobs.merge(&engine, None, None);

        assert!(matches!(
            jobs.wait(Duration::from_secs(5)),
            Some(JobEvent::Merge(Err(MergeError::InvalidInput(_))))
        ));
    }

    #[test]
    fn file_details_name_the_file_they_describe() {
        let dir = tempdir().unwrap();
        let file = AudioFile::new(dir.path().join("voice.mp3"), Category::Recorded);
        fs::write(&file.path, b"not really audio").unwrap();
        let jobs = Jobs::new();
        jobs.probe(file.clone());

        match jobs.wait(Duration::from_secs(5)) {
            Some(JobEvent::Probe { file: got, result }) => {
                assert_eq!(got, file);
                let info = result.unwrap();
                assert_eq!(info.size_bytes, 16);
                assert_eq!(info.duration, None);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn recording_is_encoded_and_wav_removed() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("audio_20240101_000000.mp3");
        let wav = capture_path(&target);
        fs::write(&wav, b"RIFF").unwrap();
        let pending = PendingRecording {
            wav: wav.clone(),
            target,
        };

        let engine = Arc::new(MergeEngine::new(dir.path(), "libmp3lame", TouchOutput));
        let jobs = Jobs::new();
        jobs.encode_recording(&engine, pending);

        match jobs.wait(Duration::from_secs(5)) {
            Some(JobEvent::Recorded(Ok(file))) => {
                assert_eq!(file.category, Category::Recorded);
                assert_eq!(file.file_name(), "audio_20240101_000000.mp3");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(!wav.exists());
    }
}
