//! Error types shared across the merge, search, playback and record paths.
//!
//! None of these are fatal: the runtime turns each one into a transient
//! notice and a log line.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    /// A source is missing or does not exist on disk. No process was started.
    #[error("invalid merge input: {0}")]
    InvalidInput(String),
    /// The transcoder exited unsuccessfully (`None` when killed by a signal).
    #[error("{}", process_failure_text(*.0))]
    ProcessFailure(Option<i32>),
    #[error("merge I/O failure: {0}")]
    IoFailure(String),
}

fn process_failure_text(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("transcoder exited with status {c}"),
        None => "transcoder terminated by a signal".to_string(),
    }
}

impl From<io::Error> for MergeError {
    fn from(e: io::Error) -> Self {
        MergeError::IoFailure(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server answered HTTP {0}")]
    Status(u16),
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("download I/O failure: {0}")]
    Io(#[from] io::Error),
    #[error("download cancelled")]
    Cancelled,
    #[error("cannot derive a file name from {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("cannot open {path:?}: {reason}")]
    Open { path: PathBuf, reason: String },
    #[error("cannot decode {0}")]
    Decode(String),
    #[error("no audio output: {0}")]
    Output(String),
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("no input device available")]
    NoDevice,
    #[error("input stream error: {0}")]
    Stream(String),
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),
    #[error("recording I/O failure: {0}")]
    Io(#[from] io::Error),
    #[error("encoding the recording failed: {0}")]
    Encode(#[from] MergeError),
}
