//! Wikimedia Commons search, file lookup and downloads.
//!
//! The client reports every failure as a typed error; deciding to show an
//! empty list instead is left to the caller.

mod client;
mod download;
mod types;

pub use client::SearchClient;
pub use download::{CancelToken, Progress, file_name_from_url};
pub use types::{FileInfo, SearchHit};

#[cfg(test)]
mod tests;
