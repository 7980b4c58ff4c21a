use std::sync::{Arc, Mutex};

use crate::library::{AudioFile, ProbeInfo};
use crate::playback::{PlaybackController, PlayerBackend};
use crate::record::{LevelMeter, Recorder};
use crate::search::{CancelToken, FileInfo, Progress, SearchHit};

use super::picker::Picker;

/// Number of level samples kept for the recording sparkline.
pub const METER_WIDTH: usize = 256;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tab {
    Search,
    Record,
    Files,
    Merge,
    Merged,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Search, Tab::Record, Tab::Files, Tab::Merge, Tab::Merged];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Search => "search",
            Tab::Record => "record",
            Tab::Files => "files",
            Tab::Merge => "merge",
            Tab::Merged => "merged",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// A download in flight.
pub struct ActiveDownload {
    pub url: String,
    pub progress: Progress,
    pub cancel: CancelToken,
}

pub struct SearchScreen<B: PlayerBackend> {
    pub query: String,
    /// Typing goes into the query while set.
    pub editing: bool,
    /// The query the pending search was sent with.
    pub searching: Option<String>,
    pub results: Picker<SearchHit>,
    /// Title whose file info is being looked up.
    pub resolving: Option<String>,
    /// Title that `file_info` was resolved for.
    pub resolved: Option<String>,
    pub file_info: Option<FileInfo>,
    pub fetching_preview: bool,
    pub download: Option<ActiveDownload>,
    pub player: PlaybackController<B>,
}

pub struct RecordScreen {
    pub recorder: Option<Recorder>,
    pub meter: Arc<Mutex<LevelMeter>>,
    pub encoding: bool,
    pub last: Option<AudioFile>,
}

impl RecordScreen {
    pub fn new() -> Self {
        Self {
            recorder: None,
            meter: Arc::new(Mutex::new(LevelMeter::new(METER_WIDTH))),
            encoding: false,
            last: None,
        }
    }
}

/// A library list with its own player: the files and merged tabs.
pub struct ListScreen<B: PlayerBackend> {
    pub list: Picker<AudioFile>,
    /// Size and duration of the last selected file.
    pub details: Option<ProbeInfo>,
    pub player: PlaybackController<B>,
}

pub struct MergeScreen<B: PlayerBackend> {
    pub list: Picker<AudioFile>,
    /// The recording.
    pub source_a: Option<AudioFile>,
    /// The download.
    pub source_b: Option<AudioFile>,
    pub merging: bool,
    pub details: Option<ProbeInfo>,
    pub player: PlaybackController<B>,
}
