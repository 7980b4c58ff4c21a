use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::library::AudioFile;

/// Something a controller can load: a library file, or a remote clip that
/// was fetched into memory for previewing.
#[derive(Clone)]
pub enum MediaSource {
    File(AudioFile),
    Remote {
        url: String,
        mime: String,
        bytes: Arc<[u8]>,
    },
}

impl MediaSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            MediaSource::File(f) => Some(&f.path),
            MediaSource::Remote { .. } => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            MediaSource::File(f) => f.file_name(),
            MediaSource::Remote { url, .. } => url
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or(url)
                .to_string(),
        }
    }

    /// Same path or same URL.
    pub fn same_as(&self, other: &MediaSource) -> bool {
        match (self, other) {
            (MediaSource::File(a), MediaSource::File(b)) => a == b,
            (MediaSource::Remote { url: a, .. }, MediaSource::Remote { url: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for MediaSource {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::File(file) => f.debug_tuple("File").field(&file.path).finish(),
            MediaSource::Remote { url, mime, bytes } => f
                .debug_struct("Remote")
                .field("url", url)
                .field("mime", mime)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

impl From<AudioFile> for MediaSource {
    fn from(f: AudioFile) -> Self {
        MediaSource::File(f)
    }
}
