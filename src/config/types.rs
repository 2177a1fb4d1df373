use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Comic-Ingest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub pacing: PacingConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
}

/// Remote content source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the source API (e.g. "https://otruyenapi.com")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the paginated listing endpoint
    #[serde(rename = "list-path")]
    pub list_path: String,

    /// Path prefix of the item detail endpoint; the item slug is appended
    #[serde(rename = "detail-path")]
    pub detail_path: String,

    /// CDN that serves comic thumbnails
    #[serde(rename = "image-cdn-url")]
    pub image_cdn_url: String,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Request pacing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Delay before every remote call (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Number of processed items (or chapters of one item) between batch pauses
    #[serde(rename = "batch-size")]
    pub batch_size: u32,

    /// Length of a batch pause (milliseconds)
    #[serde(rename = "batch-delay-ms")]
    pub batch_delay_ms: u64,
}

impl PacingConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

/// Worker pool sizing
#[derive(Debug, Clone, Deserialize)]
pub struct WorkersConfig {
    /// Sessions allowed to crawl at the same time
    #[serde(rename = "max-concurrent-sessions")]
    pub max_concurrent_sessions: u32,

    /// Sessions allowed to wait for a free worker before new starts are rejected
    #[serde(rename = "queue-capacity")]
    pub queue_capacity: u32,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sessions: 4,
            queue_capacity: 10,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite catalog database
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Progress channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressConfig {
    /// Buffered snapshots per subscriber before the slowest one starts lagging
    #[serde(rename = "channel-capacity")]
    pub channel_capacity: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
