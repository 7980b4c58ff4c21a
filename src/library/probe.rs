use std::io;
use std::path::Path;
use std::time::Duration;

use lofty::file::AudioFile as _;

/// Basic facts about a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeInfo {
    pub size_bytes: u64,
    /// Absent when the container could not be parsed.
    pub duration: Option<Duration>,
}

/// Reads existence and metadata of candidate audio files.
pub struct MediaProbe;

impl MediaProbe {
    /// True when `path` names an existing regular file.
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    pub fn probe(path: &Path) -> io::Result<ProbeInfo> {
        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }

        let duration = lofty::read_from_path(path)
            .ok()
            .map(|tagged| tagged.properties().duration());

        Ok(ProbeInfo {
            size_bytes: meta.len(),
            duration,
        })
    }
}
