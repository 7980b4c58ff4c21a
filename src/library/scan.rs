use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::layout::{LibraryDirs, ensure};
use super::model::{AudioFile, Category};

/// Fresh listings of the three library directories.
#[derive(Debug, Clone)]
pub struct LibraryIndex {
    dirs: LibraryDirs,
    extensions: Vec<String>,
}

impl LibraryIndex {
    pub fn new(dirs: LibraryDirs, settings: &LibrarySettings) -> Self {
        let extensions = settings
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { dirs, extensions }
    }

    pub fn dirs(&self) -> &LibraryDirs {
        &self.dirs
    }

    /// Create all three directories if absent.
    pub fn ensure_all(&self) -> io::Result<()> {
        for category in Category::ALL {
            ensure(self.dirs.dir_for(category))?;
        }
        Ok(())
    }

    /// Re-read one directory. Missing or empty directories list as empty.
    pub fn list(&self, category: Category) -> Vec<AudioFile> {
        let dir = self.dirs.dir_for(category);
        let mut files: Vec<AudioFile> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file() || e.path().is_file())
            .filter(|e| self.is_listed(e.path()))
            .map(|e| AudioFile::new(e.path(), category))
            .collect();

        files.sort_by_key(|f| f.file_name().to_lowercase());
        files
    }

    fn is_listed(&self, path: &Path) -> bool {
        let hidden = path
            .file_name()
            .and_then(|s| s.to_str())
            .map(|name| name.starts_with('.'))
            .unwrap_or(true);
        if hidden {
            return false;
        }

        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|e| e == &ext)
            })
            .unwrap_or(false)
    }
}
