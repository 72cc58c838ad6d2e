//! Live session registry.
//!
//! Tracks every session the server has accepted and owns the tasks running
//! them. Entries are added on accept and removed as soon as the session
//! finishes, whatever the outcome. On shutdown the registry drains: sessions
//! get a bounded grace period, and any still running afterwards are aborted
//! and reported.

use std::{
    collections::HashMap,
    future::Future,
    net::SocketAddr,
    time::{Duration, Instant},
};

use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::{SessionId, error::ServerError};

/// Information about a live session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Remote address of the connection
    pub peer: SocketAddr,
    /// When the connection was accepted
    pub started: Instant,
}

/// Outcome of draining the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Sessions that finished on their own during the drain
    pub finished: usize,
    /// Sessions force-terminated after the grace period
    pub aborted: usize,
}

/// How one session task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Finished,
    Aborted,
}

type SessionResult = (SessionId, Result<(), ServerError>);

/// Registry of live sessions and their tasks.
#[derive(Default)]
pub struct SessionRegistry {
    tasks: JoinSet<SessionResult>,
    live: HashMap<SessionId, SessionInfo>,
    /// Task → session, for tasks that end without returning (panic, abort).
    task_sessions: HashMap<task::Id, SessionId>,
    next_id: SessionId,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next session id. Ids are never reused.
    pub fn next_id(&mut self) -> SessionId {
        self.next_id += 1;
        self.next_id
    }

    /// Register session `id` and run `session` as its task.
    pub fn spawn<F>(&mut self, id: SessionId, peer: SocketAddr, session: F)
    where
        F: Future<Output = Result<(), ServerError>> + Send + 'static,
    {
        info!(session = id, %peer, live = self.live.len() + 1, "session accepted");

        let handle = self.tasks.spawn(async move { (id, session.await) });
        self.task_sessions.insert(handle.id(), id);
        self.live.insert(id, SessionInfo { peer, started: Instant::now() });
    }

    /// Wait for the next session to finish and remove it.
    ///
    /// Returns `None` when no sessions are running.
    pub async fn join_next(&mut self) -> Option<SessionId> {
        let joined = self.tasks.join_next_with_id().await?;
        Some(self.complete(joined).0)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Whether session `id` is live.
    pub fn contains(&self, id: SessionId) -> bool {
        self.live.contains_key(&id)
    }

    /// Information about live session `id`.
    pub fn info(&self, id: SessionId) -> Option<&SessionInfo> {
        self.live.get(&id)
    }

    /// Wait up to `grace` for every session to finish, then abort the rest.
    pub async fn drain(&mut self, grace: Duration) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        if self.live.is_empty() {
            return report;
        }
        info!(live = self.live.len(), ?grace, "draining sessions");

        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = self.tasks.join_next_with_id().await {
                let (_, outcome) = self.complete(joined);
                report.record(outcome);
            }
        })
        .await;

        if drained.is_err() {
            for (id, info) in &self.live {
                error!(
                    session = id,
                    peer = %info.peer,
                    age = ?info.started.elapsed(),
                    "session still running after grace period, aborting"
                );
            }
            self.tasks.abort_all();
            while let Some(joined) = self.tasks.join_next_with_id().await {
                let (_, outcome) = self.complete(joined);
                report.record(outcome);
            }
        }

        info!(finished = report.finished, aborted = report.aborted, "sessions drained");
        report
    }

    /// Remove a finished task's session and log how it ended.
    fn complete(
        &mut self,
        joined: Result<(task::Id, SessionResult), JoinError>,
    ) -> (SessionId, Outcome) {
        let (task_id, id, outcome) = match joined {
            Ok((task_id, (id, result))) => {
                if let Err(e) = result {
                    warn!(session = id, error = %e, "session failed");
                }
                (task_id, id, Outcome::Finished)
            },
            Err(e) => {
                let task_id = e.id();
                let id = self.task_sessions.get(&task_id).copied().unwrap_or_default();
                if e.is_panic() {
                    error!(session = id, "session panicked");
                    (task_id, id, Outcome::Finished)
                } else {
                    (task_id, id, Outcome::Aborted)
                }
            },
        };

        self.task_sessions.remove(&task_id);
        if let Some(info) = self.live.remove(&id) {
            debug!(session = id, peer = %info.peer, duration = ?info.started.elapsed(), "session removed");
        }
        (id, outcome)
    }
}

impl ShutdownReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Finished => self.finished += 1,
            Outcome::Aborted => self.aborted += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future;

    use super::*;

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 40000))
    }

    #[test]
    fn ids_are_unique() {
        let mut registry = SessionRegistry::new();
        let first = registry.next_id();
        let second = registry.next_id();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn finished_sessions_are_removed() {
        let mut registry = SessionRegistry::new();
        let id = registry.next_id();
        registry.spawn(id, peer(), async { Ok(()) });
        assert!(registry.contains(id));
        assert_eq!(registry.info(id).map(|info| info.peer), Some(peer()));

        assert_eq!(registry.join_next().await, Some(id));
        assert!(registry.is_empty());
        assert_eq!(registry.join_next().await, None);
    }

    #[tokio::test]
    async fn failed_session_does_not_affect_others() {
        let mut registry = SessionRegistry::new();
        let failing = registry.next_id();
        let healthy = registry.next_id();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        registry.spawn(failing, peer(), async { Err(ServerError::Config("boom".into())) });
        registry.spawn(healthy, peer(), async move {
            let _ = release_rx.await;
            Ok(())
        });

        assert_eq!(registry.join_next().await, Some(failing));
        assert!(registry.contains(healthy));

        release_tx.send(()).unwrap();
        assert_eq!(registry.join_next().await, Some(healthy));
    }

    #[tokio::test]
    async fn panicking_session_is_removed() {
        let mut registry = SessionRegistry::new();
        let id = registry.next_id();
        registry.spawn(id, peer(), async { panic!("session bug") });

        assert_eq!(registry.join_next().await, Some(id));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn drain_waits_for_quick_sessions() {
        let mut registry = SessionRegistry::new();
        for _ in 0..3 {
            let id = registry.next_id();
            registry.spawn(id, peer(), async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(())
            });
        }

        let report = registry.drain(Duration::from_secs(5)).await;
        assert_eq!(report, ShutdownReport { finished: 3, aborted: 0 });
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn drain_aborts_stragglers() {
        let mut registry = SessionRegistry::new();
        let quick = registry.next_id();
        registry.spawn(quick, peer(), async { Ok(()) });
        let stuck = registry.next_id();
        registry.spawn(stuck, peer(), future::pending());

        let report = registry.drain(Duration::from_millis(50)).await;
        assert_eq!(report, ShutdownReport { finished: 1, aborted: 1 });
        assert!(registry.is_empty());
    }
}
