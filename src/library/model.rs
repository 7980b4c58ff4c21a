use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Which of the three library directories a file belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Recorded,
    Downloaded,
    Merged,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Recorded, Category::Downloaded, Category::Merged];

    pub fn label(self) -> &'static str {
        match self {
            Category::Recorded => "Recordings",
            Category::Downloaded => "Downloads",
            Category::Merged => "Merged",
        }
    }
}

/// A reference to an audio file on disk.
///
/// Identity is the path: two values with the same path compare equal even if
/// they were built with different categories.
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub path: PathBuf,
    pub name: String,
    pub category: Category,
}

impl AudioFile {
    pub fn new(path: impl Into<PathBuf>, category: Category) -> Self {
        let path = path.into();
        let name = stem_of(&path);
        Self {
            path,
            name,
            category,
        }
    }

    /// File name including the extension, for list rows.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

impl PartialEq for AudioFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for AudioFile {}

impl Hash for AudioFile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl fmt::Display for AudioFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
