use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::PathSettings;

use super::model::Category;

/// Locations of the recordings, downloads and merged-output directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDirs {
    pub recorded: PathBuf,
    pub downloaded: PathBuf,
    pub merged: PathBuf,
}

impl LibraryDirs {
    /// Place all three directories under `root`, keeping the default names.
    pub fn under(root: &Path) -> Self {
        Self {
            recorded: root.join("recorded_audio"),
            downloaded: root.join("downloaded_audio"),
            merged: root.join("merged_audio"),
        }
    }

    /// Platform defaults with any configured overrides applied.
    ///
    /// Recordings live in the user's music directory and merges sit next to
    /// them; downloads go to the shared downloads directory.
    pub fn resolve(overrides: &PathSettings) -> Self {
        let music = ::dirs::audio_dir()
            .or_else(|| ::dirs::home_dir().map(|h| h.join("Music")))
            .unwrap_or_else(|| PathBuf::from("Music"));
        let downloads = ::dirs::download_dir()
            .or_else(|| ::dirs::home_dir().map(|h| h.join("Downloads")))
            .unwrap_or_else(|| PathBuf::from("Downloads"));

        let recorded = overrides
            .recorded_dir
            .clone()
            .unwrap_or_else(|| music.join("soundmix").join("recorded_audio"));
        let merged = overrides.merged_dir.clone().unwrap_or_else(|| {
            recorded
                .parent()
                .map(|p| p.join("merged_audio"))
                .unwrap_or_else(|| PathBuf::from("merged_audio"))
        });
        let downloaded = overrides
            .downloaded_dir
            .clone()
            .unwrap_or_else(|| downloads.join("downloaded_audio"));

        Self {
            recorded,
            downloaded,
            merged,
        }
    }

    pub fn dir_for(&self, category: Category) -> &Path {
        match category {
            Category::Recorded => &self.recorded,
            Category::Downloaded => &self.downloaded,
            Category::Merged => &self.merged,
        }
    }
}

/// Create `path` and any missing parents. Succeeds if it already exists.
pub fn ensure(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}
