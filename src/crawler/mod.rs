//! Crawler module for session orchestration
//!
//! This module contains the core crawling logic, including:
//! - Request pacing and cooperative cancellation
//! - Chapter number parsing
//! - The page/item/chapter traversal of one session
//! - Session tasks, the bounded worker pool and the session registry

mod orchestrator;
mod pacer;
mod parser;
mod pool;
mod registry;
mod task;

pub use orchestrator::{CrawlOrchestrator, RunOutcome};
pub use pacer::{is_batch_boundary, Pacer, RunControl};
pub use parser::parse_chapter_number;
pub use pool::{PoolError, WorkerPool};
pub use registry::{SessionRegistry, SessionStatus, StartResponse, StopResponse};
pub use task::{CrawlTask, SESSION_ERROR_KEY};

pub use crate::session::CrawlRequest;

use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::progress::ProgressChannel;
use crate::source::SourceClient;
use std::sync::Arc;

/// Wires a registry from configuration and already-built collaborators
///
/// # Arguments
///
/// * `config` - Pacing and worker settings are taken from here
/// * `source` - The content source every session reads from
/// * `catalog` - The catalog every session writes to
/// * `channel` - Where progress snapshots are published
pub fn build_registry(
    config: &Config,
    source: Arc<dyn SourceClient>,
    catalog: Arc<dyn CatalogStore>,
    channel: Arc<dyn ProgressChannel>,
) -> SessionRegistry {
    let orchestrator = CrawlOrchestrator::new(
        source,
        catalog,
        Pacer::from_config(&config.pacing),
        crate::progress::ProgressReporter::new(channel),
    );
    let pool = WorkerPool::new(
        config.workers.max_concurrent_sessions as usize,
        config.workers.queue_capacity as usize,
    );
    SessionRegistry::new(Arc::new(orchestrator), pool)
}
