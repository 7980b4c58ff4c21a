use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeZone};

/// `audio_<yyyyMMdd_HHmmss>.mp3` for a recording started at `now`.
pub fn recording_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("audio_{}.mp3", now.format("%Y%m%d_%H%M%S"))
}

/// Where the raw WAV for `target` is captured: a hidden
/// `.audio_<ts>.wav` beside it, so library listings never show a take
/// that is still being written.
pub fn capture_path(target: &Path) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{stem}.wav"))
}

/// Recording clock as `MM:SS`.
pub fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
