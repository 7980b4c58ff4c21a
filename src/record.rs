//! Microphone recording and the input level meter.

mod capture;
mod levels;
mod naming;

pub use capture::{PendingRecording, Recorder};
pub use levels::{LevelMeter, amplitudes};
pub use naming::{capture_path, format_clock, recording_file_name};
