use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/soundmix/config.toml` or `~/.config/soundmix/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SOUNDMIX__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub merge: MergeSettings,
    pub search: SearchSettings,
    pub library: LibrarySettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

/// Overrides for the three library directories. Unset entries use platform defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub recorded_dir: Option<PathBuf>,
    pub downloaded_dir: Option<PathBuf>,
    pub merged_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    /// Path or name of the ffmpeg binary.
    pub ffmpeg_path: String,
    /// Audio codec passed to `-c:a`.
    pub codec: String,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            codec: "libmp3lame".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// MediaWiki `api.php` endpoint.
    pub endpoint: String,
    /// `srlimit` sent with every search.
    pub limit: u32,
    /// Per-request timeout (seconds). Downloads use it as a connect timeout only.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://commons.wikimedia.org/w/api.php".to_string(),
            limit: 50,
            timeout_secs: 20,
            user_agent: concat!("soundmix/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to list (case-insensitive, without dot).
    pub extensions: Vec<String>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: ["mp3", "wav", "ogg", "oga", "opus", "flac", "m4a", "webm", "3gp"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Event loop tick (milliseconds).
    pub tick_ms: u64,
    /// How long a notice stays on screen (milliseconds).
    pub notice_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ search, record, merge ~ ".to_string(),
            tick_ms: 50,
            notice_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Log file. Defaults to `<state dir>/soundmix/soundmix.log`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
