//! HTTP source client
//!
//! This module handles all requests to the remote source, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Fetching listing pages, item details and chapter image lists
//! - Classifying failures into `SourceError` values the orchestrator can record

use crate::config::SourceConfig;
use crate::source::types::{ChapterData, DetailData, Envelope, ListData};
use crate::source::{SourceChapterImages, SourceError, SourceItemDetail, SourceItemSummary};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// What the crawler needs from a content source
///
/// Every failure comes back as a `SourceError` value; none of them is fatal to a crawl.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// One page of the paginated item listing
    async fn list_items(&self, page: u32) -> Result<Vec<SourceItemSummary>, SourceError>;

    /// Full metadata of an item, addressed by the source's own slug
    async fn fetch_item_detail(&self, source_slug: &str) -> Result<SourceItemDetail, SourceError>;

    /// CDN domain, chapter path and ordered images of one chapter
    async fn fetch_chapter_images(
        &self,
        chapter_api_ref: &str,
    ) -> Result<SourceChapterImages, SourceError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use comic_ingest::config::SourceConfig;
/// use comic_ingest::source::build_http_client;
///
/// let config = SourceConfig {
///     base_url: "https://otruyenapi.com".to_string(),
///     list_path: "/v1/api/danh-sach/truyen-moi".to_string(),
///     detail_path: "/v1/api/truyen-tranh".to_string(),
///     image_cdn_url: "https://img.otruyenapi.com".to_string(),
///     user_agent: "comic-ingest/1.0".to_string(),
///     request_timeout_secs: 30,
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &SourceConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `SourceClient` over the source's JSON API
pub struct HttpSourceClient {
    client: Client,
    base_url: Url,
    list_path: String,
    detail_path: String,
    image_cdn_url: String,
}

impl HttpSourceClient {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SourceError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        let client = build_http_client(config).map_err(|source| SourceError::Http {
            url: config.base_url.clone(),
            source,
        })?;

        Ok(Self {
            client,
            base_url,
            list_path: config.list_path.clone(),
            detail_path: config.detail_path.trim_end_matches('/').to_string(),
            image_cdn_url: config.image_cdn_url.trim_end_matches('/').to_string(),
        })
    }

    /// Absolute thumbnail URL for a thumbnail file name reported by the listing
    pub fn thumbnail_url(&self, thumb: &str) -> Option<String> {
        let thumb = thumb.trim();
        if thumb.is_empty() {
            None
        } else if thumb.starts_with("http://") || thumb.starts_with("https://") {
            Some(thumb.to_string())
        } else {
            Some(format!(
                "{}/uploads/comics/{}",
                self.image_cdn_url,
                thumb.trim_start_matches('/')
            ))
        }
    }

    fn join(&self, path: &str) -> Result<Url, SourceError> {
        self.base_url
            .join(path)
            .map_err(|e| SourceError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Chapter references are absolute URLs on the source's API host; relative ones are
    /// resolved against the base URL
    fn resolve_chapter_ref(&self, chapter_api_ref: &str) -> Result<Url, SourceError> {
        match Url::parse(chapter_api_ref) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self.join(chapter_api_ref),
            Err(e) => Err(SourceError::InvalidUrl(format!(
                "{}: {}",
                chapter_api_ref, e
            ))),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SourceError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| SourceError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| SourceError::Http {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|source| SourceError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl SourceClient for HttpSourceClient {
    async fn list_items(&self, page: u32) -> Result<Vec<SourceItemSummary>, SourceError> {
        let mut url = self.join(&self.list_path)?;
        url.query_pairs_mut().append_pair("page", &page.to_string());

        let envelope: Envelope<ListData> = self.get_json(url.clone()).await?;
        let data = envelope.data.ok_or_else(|| SourceError::MissingData {
            url: url.to_string(),
        })?;

        Ok(data
            .items
            .into_iter()
            .map(|mut item| {
                item.thumb_url = item.thumb_url.as_deref().and_then(|t| self.thumbnail_url(t));
                item
            })
            .collect())
    }

    async fn fetch_item_detail(&self, source_slug: &str) -> Result<SourceItemDetail, SourceError> {
        let url = self.join(&format!("{}/{}", self.detail_path, source_slug))?;

        let envelope: Envelope<DetailData> = self.get_json(url.clone()).await?;
        envelope
            .data
            .and_then(|data| data.item)
            .ok_or_else(|| SourceError::MissingData {
                url: url.to_string(),
            })
    }

    async fn fetch_chapter_images(
        &self,
        chapter_api_ref: &str,
    ) -> Result<SourceChapterImages, SourceError> {
        let url = self.resolve_chapter_ref(chapter_api_ref)?;

        let envelope: Envelope<ChapterData> = self.get_json(url.clone()).await?;
        let data = envelope.data.ok_or_else(|| SourceError::MissingData {
            url: url.to_string(),
        })?;
        let item = data.item.ok_or_else(|| SourceError::MissingData {
            url: url.to_string(),
        })?;

        Ok(SourceChapterImages {
            cdn_domain: data.domain_cdn,
            chapter_path: item.chapter_path,
            images: item.chapter_image,
        })
    }
}
