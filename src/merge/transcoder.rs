use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

/// Runs an external transcoding process with a prepared argument list.
pub trait Transcoder: Send + Sync {
    /// Blocks until the process exits. Returns its exit code, or `None` when
    /// it was terminated by a signal.
    fn execute(&self, args: &[OsString]) -> io::Result<Option<i32>>;
}

/// The `ffmpeg` command-line tool.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
}

/// Lines of stderr kept for the failure log.
const STDERR_TAIL_LINES: usize = 8;

impl FfmpegTranscoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Transcoder for FfmpegTranscoder {
    fn execute(&self, args: &[OsString]) -> io::Result<Option<i32>> {
        debug!(program = %self.program.display(), ?args, "spawning transcoder");

        let output = Command::new(&self.program)
            .args(["-hide_banner", "-nostdin", "-loglevel", "error"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            warn!(status = ?output.status.code(), "transcoder failed:\n{tail}");
        }

        Ok(output.status.code())
    }
}
