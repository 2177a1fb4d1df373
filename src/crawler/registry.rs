//! Session registry - start, query and stop crawl sessions
//!
//! The registry is the only state shared between sessions. It maps session ids to their
//! running tasks, hands new tasks to the worker pool, and owns the shutdown token every
//! task listens to.

use crate::crawler::orchestrator::CrawlOrchestrator;
use crate::crawler::pool::WorkerPool;
use crate::crawler::task::CrawlTask;
use crate::session::CrawlRequest;
use crate::RegistryError;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Reply to a successful start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartResponse {
    pub session_id: String,
    pub message: String,
}

/// Reply to a successful stop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopResponse {
    pub session_id: String,
    pub message: String,
}

/// Coarse status of a registered session
///
/// Detailed progress is only available from the progress channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
        }
    }
}

struct RegistryInner {
    tasks: Mutex<HashMap<String, Arc<CrawlTask>>>,
    orchestrator: Arc<CrawlOrchestrator>,
    pool: WorkerPool,
    shutdown: CancellationToken,
}

/// Cloneable handle to the set of running sessions
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

impl SessionRegistry {
    pub fn new(orchestrator: Arc<CrawlOrchestrator>, pool: WorkerPool) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                tasks: Mutex::new(HashMap::new()),
                orchestrator,
                pool,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Starts a session under a freshly generated id
    pub fn start(&self, request: CrawlRequest) -> Result<StartResponse, RegistryError> {
        self.start_with_id(request, uuid::Uuid::new_v4().to_string())
    }

    /// Starts a session under a caller-supplied id
    ///
    /// The session is registered before this returns; the crawl itself runs on the pool.
    pub fn start_with_id(
        &self,
        request: CrawlRequest,
        session_id: impl Into<String>,
    ) -> Result<StartResponse, RegistryError> {
        request.validate().map_err(RegistryError::InvalidRequest)?;
        let session_id = session_id.into();

        let task = Arc::new(CrawlTask::new(
            session_id.clone(),
            request,
            self.inner.orchestrator.clone(),
            self.inner.shutdown.clone(),
        ));

        {
            let mut tasks = self.lock();
            if tasks.contains_key(&session_id) {
                return Err(RegistryError::DuplicateSession(session_id));
            }
            tasks.insert(session_id.clone(), task.clone());
        }

        let registry = self.clone();
        let job = task.clone().run(registry);
        if let Err(e) = self.inner.pool.submit(async move {
            job.await;
        }) {
            tracing::warn!("Rejected session {}: {}", session_id, e);
            self.deregister(&task);
            return Err(e.into());
        }

        tracing::info!(
            "Started session {} for pages {}..={}",
            session_id,
            request.start_page,
            request.end_page
        );
        Ok(StartResponse {
            message: format!("Crawl session {} started", session_id),
            session_id,
        })
    }

    pub fn status(&self, session_id: &str) -> Result<SessionStatus, RegistryError> {
        if self.lock().contains_key(session_id) {
            Ok(SessionStatus::Running)
        } else {
            Err(RegistryError::NotFound(session_id.to_string()))
        }
    }

    /// Requests a stop and forgets the session
    ///
    /// The task keeps running until its next checkpoint and still publishes its final
    /// snapshot.
    pub fn stop(&self, session_id: &str) -> Result<StopResponse, RegistryError> {
        let task = self
            .lock()
            .remove(session_id)
            .ok_or_else(|| RegistryError::NotFound(session_id.to_string()))?;
        task.stop();

        Ok(StopResponse {
            session_id: session_id.to_string(),
            message: format!("Stop requested for crawl session {}", session_id),
        })
    }

    /// Ids of registered sessions, sorted
    pub fn active_sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Interrupts every session at its next pacing wait; they end with an error status
    pub fn shutdown(&self) {
        tracing::info!("Shutting down {} sessions", self.lock().len());
        self.inner.shutdown.cancel();
    }

    /// Removes `task` if it is still the registered entry for its id
    pub(crate) fn deregister(&self, task: &Arc<CrawlTask>) {
        let mut tasks = self.lock();
        if tasks
            .get(task.session_id())
            .is_some_and(|current| Arc::ptr_eq(current, task))
        {
            tasks.remove(task.session_id());
            tracing::debug!("Deregistered session {}", task.session_id());
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<CrawlTask>>> {
        self.inner
            .tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
