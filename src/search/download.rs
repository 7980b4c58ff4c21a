use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::Url;
use tracing::{info, warn};

use crate::error::{DownloadError, NetworkError};
use crate::library::{AudioFile, Category, ensure};

use super::client::{SearchClient, checked};

const CHUNK: usize = 8 * 1024;

/// Cooperative cancellation flag shared between the UI and a worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bytes received so far, and the expected total when the server sent one.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub downloaded: u64,
    pub total: Option<u64>,
}

impl Progress {
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(t) if t > 0 => Some((self.downloaded as f64 / t as f64).min(1.0)),
            _ => None,
        }
    }

    pub fn percent(&self) -> Option<u8> {
        self.fraction().map(|f| (f * 100.0).floor() as u8)
    }
}

/// Local file name for a media URL: the last path segment, percent-decoded,
/// with anything that could escape the target directory rejected.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let last = url.path_segments()?.next_back()?;
    let decoded = percent_decode(last);
    let name: String = decoded
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    let name = name.trim().to_string();
    if name.is_empty() || name == "." || name == ".." || name.starts_with('.') {
        return None;
    }
    Some(name)
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}

impl SearchClient {
    /// Stream `url` into `dest_dir`, reporting progress after every chunk.
    ///
    /// The body goes to `<name>.part` first and is renamed into place once
    /// complete, so a cancelled or failed download never leaves a file the
    /// library would list.
    pub fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        mut on_progress: impl FnMut(Progress),
        cancel: &CancelToken,
    ) -> Result<AudioFile, DownloadError> {
        let name = file_name_from_url(url).ok_or_else(|| DownloadError::InvalidUrl(url.into()))?;
        ensure(dest_dir)?;
        let target = dest_dir.join(&name);
        let partial = part_path(&target);

        let mut resp = checked(self.media.get(url).send().map_err(NetworkError::from)?)?;
        let mut progress = Progress {
            downloaded: 0,
            total: resp.content_length(),
        };
        info!(%url, total = ?progress.total, "download started");
        on_progress(progress);

        let result = (|| -> Result<(), DownloadError> {
            let mut out = BufWriter::new(File::create(&partial)?);
            let mut buf = vec![0u8; CHUNK];
            loop {
                if cancel.is_cancelled() {
                    return Err(DownloadError::Cancelled);
                }
                let n = resp.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                out.write_all(&buf[..n])?;
                progress.downloaded += n as u64;
                on_progress(progress);
            }
            out.flush()?;
            Ok(())
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&partial);
            match &e {
                DownloadError::Cancelled => info!(%url, "download cancelled"),
                other => warn!(%url, error = %other, "download failed"),
            }
            return Err(e);
        }

        fs::rename(&partial, &target)?;
        info!(path = %target.display(), bytes = progress.downloaded, "download finished");
        Ok(AudioFile::new(target, Category::Downloaded))
    }
}
