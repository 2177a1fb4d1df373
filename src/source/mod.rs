//! Remote content source
//!
//! This module defines what the crawler needs from the third-party source:
//! - One page of the paginated item listing
//! - The full detail of an item, including its chapter list
//! - The ordered image list of one chapter
//!
//! `HttpSourceClient` implements it over the source's JSON API.

mod client;
mod types;

pub use client::{build_http_client, HttpSourceClient, SourceClient};
pub use types::{
    ChapterServer, SourceCategory, SourceChapter, SourceChapterImages, SourceImage,
    SourceItemDetail, SourceItemSummary,
};

use thiserror::Error;

/// Errors returned by a source client
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid response body from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("Response from {url} has no data")]
    MissingData { url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
