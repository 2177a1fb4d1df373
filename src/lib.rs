//! Comic-Ingest: an incremental comic catalog crawler
//!
//! This crate pulls comic and chapter metadata plus chapter image lists from a paginated
//! third-party source into a local catalog. Crawls run as cancelable sessions on a bounded
//! worker pool and stream full progress snapshots to subscribers.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod output;
pub mod progress;
pub mod session;
pub mod slug;
pub mod source;

use thiserror::Error;

/// Main error type for Comic-Ingest operations
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] source::SourceError),

    #[error("Storage error: {0}")]
    Storage(#[from] catalog::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("Session error: {0}")]
    Registry(#[from] RegistryError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while traversing the source inside one session
///
/// Everything except `Interrupted` is recorded against the item being processed and the
/// traversal moves on. `Interrupted` ends the whole session.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Pacing wait interrupted by shutdown")]
    Interrupted,

    #[error(transparent)]
    Source(#[from] source::SourceError),

    #[error(transparent)]
    Storage(#[from] catalog::StorageError),

    #[error("Invalid item: {0}")]
    InvalidItem(String),
}

/// Errors returned synchronously by the session registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session already registered: {0}")]
    DuplicateSession(String),

    #[error("Invalid crawl request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Pool(#[from] crawler::PoolError),
}

/// Result type alias for Comic-Ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for a single crawl traversal
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOrchestrator, CrawlRequest, SessionRegistry};
pub use session::{CrawlSession, CrawlStatus};
pub use slug::slugify;
