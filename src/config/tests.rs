use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use super::load::{default_config_path, resolve_config_path};
use super::schema::*;

static ENV: Mutex<()> = Mutex::new(());

/// Holds the process-wide env lock and puts every variable it touched back
/// when dropped.
struct ScopedEnv {
    saved: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    fn new() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENV.lock().unwrap_or_else(|e| e.into_inner()),
        }
    }

    fn set(mut self, key: &'static str, val: impl AsRef<std::ffi::OsStr>) -> Self {
        self.save(key);
        unsafe { std::env::set_var(key, val) };
        self
    }

    fn unset(mut self, key: &'static str) -> Self {
        self.save(key);
        unsafe { std::env::remove_var(key) };
        self
    }

    fn save(&mut self, key: &'static str) {
        if !self.saved.iter().any(|(k, _)| *k == key) {
            self.saved.push((key, std::env::var_os(key)));
        }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, old) in self.saved.drain(..).rev() {
            match old {
                Some(v) => unsafe { std::env::set_var(key, v) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn explicit_config_path_wins_over_the_default() {
    let _env = ScopedEnv::new()
        .set("SOUNDMIX_CONFIG_PATH", "/tmp/soundmix-test-config.toml")
        .set("XDG_CONFIG_HOME", "/tmp/xdg");
    assert_eq!(
        resolve_config_path(),
        Some(PathBuf::from("/tmp/soundmix-test-config.toml"))
    );
}

#[test]
fn default_config_lives_under_xdg_config_home() {
    let _env = ScopedEnv::new()
        .set("XDG_CONFIG_HOME", "/tmp/xdg-config-home")
        .set("HOME", "/tmp/home-should-not-win");
    assert_eq!(
        default_config_path(),
        Some(PathBuf::from("/tmp/xdg-config-home/soundmix/config.toml"))
    );
}

#[test]
fn default_config_falls_back_to_home_dot_config() {
    let _env = ScopedEnv::new()
        .unset("XDG_CONFIG_HOME")
        .set("HOME", "/tmp/home-dir");
    assert_eq!(
        default_config_path(),
        Some(PathBuf::from("/tmp/home-dir/.config/soundmix/config.toml"))
    );
}

#[test]
fn defaults_match_wikimedia_and_ffmpeg_policy() {
    let s = Settings::default();
    assert_eq!(s.search.endpoint, "https://commons.wikimedia.org/w/api.php");
    assert_eq!(s.search.limit, 50);
    assert_eq!(s.merge.ffmpeg_path, "ffmpeg");
    assert_eq!(s.merge.codec, "libmp3lame");
    assert!(s.library.extensions.iter().any(|e| e == "mp3"));
    assert!(s.validate().is_ok());
}

#[test]
fn settings_load_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg_path = write_config(
        &dir,
        r#"
[paths]
recorded_dir = "/data/rec"
merged_dir = "/data/merged"

[merge]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
codec = "libvorbis"

[search]
endpoint = "http://127.0.0.1:9/w/api.php"
limit = 10
timeout_secs = 3

[library]
extensions = ["mp3"]

[ui]
header_text = "hello"
tick_ms = 20

[logging]
level = "debug"
file = "/tmp/soundmix.log"
"#,
    );
    let _env = ScopedEnv::new()
        .set("SOUNDMIX_CONFIG_PATH", &cfg_path)
        .unset("SOUNDMIX__MERGE__CODEC");

    let s = Settings::load().unwrap();
    assert_eq!(s.paths.recorded_dir, Some("/data/rec".into()));
    assert_eq!(s.paths.downloaded_dir, None);
    assert_eq!(s.paths.merged_dir, Some("/data/merged".into()));
    assert_eq!(s.merge.ffmpeg_path, "/opt/ffmpeg/bin/ffmpeg");
    assert_eq!(s.merge.codec, "libvorbis");
    assert_eq!(s.search.endpoint, "http://127.0.0.1:9/w/api.php");
    assert_eq!(s.search.limit, 10);
    assert_eq!(s.search.timeout_secs, 3);
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.tick_ms, 20);
    assert_eq!(s.ui.notice_ms, UiSettings::default().notice_ms);
    assert_eq!(s.logging.level, "debug");
    assert_eq!(s.logging.file, Some("/tmp/soundmix.log".into()));
}

#[test]
fn settings_env_overrides_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg_path = write_config(&dir, "[merge]\ncodec = \"libmp3lame\"\n");
    let _env = ScopedEnv::new()
        .set("SOUNDMIX_CONFIG_PATH", &cfg_path)
        .set("SOUNDMIX__MERGE__CODEC", "aac")
        .set("SOUNDMIX__SEARCH__LIMIT", "7");

    let s = Settings::load().unwrap();
    assert_eq!(s.merge.codec, "aac");
    assert_eq!(s.search.limit, 7);
}

#[test]
fn validate_rejects_bad_values() {
    let mut s = Settings::default();
    s.search.limit = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.merge.ffmpeg_path = "  ".into();
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.ui.tick_ms = 0;
    assert!(s.validate().is_err());
}
