//! Progress publication
//!
//! Every state change of a running session is pushed as a full `CrawlSession` snapshot to
//! the per-session topic `/topic/crawler/{session_id}`. Delivery is best effort: a failed
//! send is logged and the crawl carries on.

use crate::session::CrawlSession;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors raised by a progress channel
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("No subscribers for {0}")]
    NoSubscribers(String),

    #[error("Progress channel closed")]
    Closed,
}

/// Topic a session's snapshots are published on
pub fn topic_for(session_id: &str) -> String {
    format!("/topic/crawler/{}", session_id)
}

/// Transport that carries snapshots to subscribers
pub trait ProgressChannel: Send + Sync {
    fn send(&self, topic: &str, session: &CrawlSession) -> Result<(), ProgressError>;
}

/// One published snapshot
#[derive(Debug, Clone)]
pub struct ProgressMessage {
    pub topic: String,
    pub session: CrawlSession,
}

/// In-process fan-out over a tokio broadcast channel
///
/// Slow subscribers lag and skip snapshots instead of blocking the crawl.
#[derive(Clone)]
pub struct BroadcastChannel {
    sender: broadcast::Sender<ProgressMessage>,
}

impl BroadcastChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressMessage> {
        self.sender.subscribe()
    }
}

impl ProgressChannel for BroadcastChannel {
    fn send(&self, topic: &str, session: &CrawlSession) -> Result<(), ProgressError> {
        self.sender
            .send(ProgressMessage {
                topic: topic.to_string(),
                session: session.clone(),
            })
            .map(|_| ())
            .map_err(|_| ProgressError::NoSubscribers(topic.to_string()))
    }
}

/// Publishes snapshots and swallows delivery failures
#[derive(Clone)]
pub struct ProgressReporter {
    channel: Arc<dyn ProgressChannel>,
}

impl ProgressReporter {
    pub fn new(channel: Arc<dyn ProgressChannel>) -> Self {
        Self { channel }
    }

    pub fn publish(&self, session: &CrawlSession) {
        let topic = topic_for(&session.session_id);
        if let Err(e) = self.channel.send(&topic, session) {
            tracing::trace!("Progress for {} not delivered: {}", session.session_id, e);
        }
    }
}
