use std::collections::HashMap;

use serde::Deserialize;

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    pub title: String,
    /// Raw snippet; contains `<span class="searchmatch">` highlighting.
    #[serde(default)]
    pub snippet: String,
}

impl SearchHit {
    /// The snippet without markup or HTML entities.
    pub fn plain_snippet(&self) -> String {
        strip_markup(&self.snippet)
    }
}

/// Direct media URL of a file page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileInfo {
    pub url: String,
    #[serde(rename = "mime")]
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub info: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchResponse {
    pub query: Option<SearchQuery>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    #[serde(default)]
    pub search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FileInfoResponse {
    pub query: Option<FileInfoQuery>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FileInfoQuery {
    #[serde(default)]
    pub pages: HashMap<String, FileInfoPage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FileInfoPage {
    #[serde(default)]
    pub imageinfo: Vec<FileInfo>,
}

impl FileInfoResponse {
    /// First media asset of the first page that has one.
    pub fn first_file(self) -> Option<FileInfo> {
        self.query?
            .pages
            .into_values()
            .find_map(|p| p.imageinfo.into_iter().next())
    }
}

fn strip_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    out.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
