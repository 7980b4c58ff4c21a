use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::SearchSettings;
use crate::error::NetworkError;

use super::types::{ApiError, FileInfo, FileInfoResponse, SearchHit, SearchResponse};

/// The File namespace on MediaWiki sites.
const FILE_NAMESPACE: &str = "6";

/// Blocking client for the MediaWiki `api.php` endpoint.
///
/// Every call blocks on the network; run them on a worker thread.
#[derive(Debug, Clone)]
pub struct SearchClient {
    /// Bounded by `timeout_secs` end to end.
    api: Client,
    /// Connect timeout only, so long downloads are not cut off.
    pub(super) media: Client,
    endpoint: String,
    limit: u32,
}

impl SearchClient {
    pub fn new(settings: &SearchSettings) -> Result<Self, NetworkError> {
        let timeout = Duration::from_secs(settings.timeout_secs.max(1));
        let api = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(timeout)
            .build()?;
        let media = Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(timeout)
            .timeout(None::<Duration>)
            .build()?;

        Ok(Self {
            api,
            media,
            endpoint: settings.endpoint.clone(),
            limit: settings.limit,
        })
    }

    /// Full-text search of audio files in the File namespace.
    pub fn search(&self, keyword: &str) -> Result<Vec<SearchHit>, NetworkError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        let srsearch = format!("{keyword} filetype:audio");
        let limit = self.limit.to_string();
        debug!(%srsearch, "searching");

        let resp = self
            .api
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", srsearch.as_str()),
                ("srnamespace", FILE_NAMESPACE),
                ("srwhat", "text"),
                ("srlimit", limit.as_str()),
                ("format", "json"),
            ])
            .send()?;

        let body: SearchResponse = decode(resp)?;
        if let Some(err) = body.error {
            return Err(api_error(err));
        }
        Ok(body.query.map(|q| q.search).unwrap_or_default())
    }

    /// Direct URL and mime type of the media behind a file page `title`.
    pub fn resolve_download_url(&self, title: &str) -> Result<Option<FileInfo>, NetworkError> {
        let resp = self
            .api
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("prop", "imageinfo"),
                ("iiprop", "url|mime"),
                ("titles", title),
                ("format", "json"),
            ])
            .send()?;

        let body: FileInfoResponse = decode(resp)?;
        if let Some(err) = body.error {
            return Err(api_error(err));
        }
        Ok(body.first_file())
    }

    /// Fetch a whole media file into memory, for previews.
    pub fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let resp = checked(self.media.get(url).send()?)?;
        Ok(resp.bytes()?.to_vec())
    }
}

pub(super) fn checked(resp: Response) -> Result<Response, NetworkError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(NetworkError::Status(status.as_u16()));
    }
    Ok(resp)
}

fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, NetworkError> {
    let text = checked(resp)?.text()?;
    serde_json::from_str(&text).map_err(|e| NetworkError::Decode(e.to_string()))
}

fn api_error(err: ApiError) -> NetworkError {
    NetworkError::Decode(format!("{}: {}", err.code, err.info))
}
