//! One crawl session as a schedulable unit of work

use crate::crawler::orchestrator::CrawlOrchestrator;
use crate::crawler::pacer::RunControl;
use crate::crawler::registry::SessionRegistry;
use crate::session::{CrawlRequest, CrawlSession, CrawlStatus};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Error key used for failures that belong to the run rather than to an item
pub const SESSION_ERROR_KEY: &str = "session";

/// A registered crawl session
///
/// The task owns its `CrawlSession` for the duration of `run`; everybody else only sees the
/// snapshots it publishes.
pub struct CrawlTask {
    session_id: String,
    request: CrawlRequest,
    orchestrator: Arc<CrawlOrchestrator>,
    control: RunControl,
}

impl CrawlTask {
    pub fn new(
        session_id: impl Into<String>,
        request: CrawlRequest,
        orchestrator: Arc<CrawlOrchestrator>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            request,
            orchestrator,
            control: RunControl::new(CancellationToken::new(), shutdown),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Asks the run to end at its next checkpoint
    ///
    /// An in-flight remote call is allowed to finish first.
    pub fn stop(&self) {
        tracing::info!("Stop requested for session {}", self.session_id);
        self.control.stop.cancel();
    }


    /// Runs the session to a terminal state, then removes it from `registry`
    pub async fn run(self: Arc<Self>, registry: SessionRegistry) -> CrawlSession {
        let session = self.execute().await;
        registry.deregister(&self);
        session
    }

    /// Runs the session and returns its final snapshot
    ///
    /// A `Started` snapshot is published first and a terminal one last, whatever happens
    /// in between, including a panic inside the traversal.
    pub async fn execute(&self) -> CrawlSession {
        let reporter = self.orchestrator.reporter();
        let mut session = CrawlSession::new(self.session_id.clone(), self.request.page_range());
        reporter.publish(&session);

        let result = AssertUnwindSafe(self.orchestrator.run(
            &self.request,
            &mut session,
            &self.control,
        ))
        .catch_unwind()
        .await;

        let (status, failure) = match result {
            Ok(Ok(outcome)) => (outcome.status(), None),
            Ok(Err(e)) => (CrawlStatus::Error, Some(e.to_string())),
            Err(payload) => (
                CrawlStatus::Error,
                Some(format!("Crawl panicked: {}", panic_message(payload.as_ref()))),
            ),
        };

        if let Some(message) = failure {
            tracing::error!("Session {} failed: {}", self.session_id, message);
            session.record_error(SESSION_ERROR_KEY, message);
        }
        if let Err(e) = session.transition(status) {
            tracing::warn!("Session {}: {}", self.session_id, e);
        }

        tracing::info!("Session {} ended with status {}", self.session_id, session.status);
        reporter.publish(&session);
        session
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
