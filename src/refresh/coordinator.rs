use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::Error;
use crate::session::{InvalidationReason, Session};
use crate::telemetry::refresh::RefreshTelemetry;
use crate::token::TokenPair;

use super::{PendingRequest, RefreshOutcome, Refresher};

enum EpisodeState {
    Idle,
    Refreshing {
        telemetry: RefreshTelemetry,
        waiters: Vec<PendingRequest>,
        /// The session was torn down while this episode was running.
        invalidated: bool,
    },
}

enum EpisodeEnd {
    Applied(TokenPair),
    Failed(Error),
    /// The refresh overlapped a session invalidation; its result is discarded.
    Superseded(Option<Error>),
}

/// Serializes refresh attempts: at most one refresh call is in flight, and every request that
/// hit an expired token meanwhile waits for that call's outcome.
pub struct RefreshCoordinator {
    state: Mutex<EpisodeState>,
    refresher: Refresher,
    session: Arc<Session>,
    episodes: AtomicU64,
}

impl RefreshCoordinator {
    pub(crate) fn new(refresher: Refresher, session: Arc<Session>) -> Self {
        Self {
            state: Mutex::new(EpisodeState::Idle),
            refresher,
            session,
            episodes: AtomicU64::new(0),
        }
    }

    /// Number of refresh calls issued so far.
    pub fn episodes(&self) -> u64 {
        self.episodes.load(Ordering::SeqCst)
    }

    pub async fn is_refreshing(&self) -> bool {
        matches!(*self.state.lock().await, EpisodeState::Refreshing { .. })
    }

    /// Parks `pending` behind the running episode, starting one if the coordinator is idle.
    ///
    /// The refresh runs on its own task so that dropping the caller's future cannot leave the
    /// episode unfinished.
    pub async fn enqueue(self: &Arc<Self>, pending: PendingRequest) {
        let mut state = self.state.lock().await;
        if let EpisodeState::Refreshing {
            telemetry, waiters, ..
        } = &mut *state
        {
            telemetry.emit_enqueued(pending.label(), waiters.len());
            waiters.push(pending);
            return;
        }

        let telemetry = RefreshTelemetry::new(pending.label());
        telemetry.emit_enqueued(pending.label(), 0);
        *state = EpisodeState::Refreshing {
            telemetry: telemetry.clone(),
            waiters: vec![pending],
            invalidated: false,
        };
        drop(state);

        self.episodes.fetch_add(1, Ordering::SeqCst);
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.run_episode(telemetry).await });
    }

    /// Tears the session down. A running episode is marked so that its refresh result is not
    /// written back over the cleared store.
    pub(crate) async fn invalidate_session(&self, reason: InvalidationReason) {
        let mut state = self.state.lock().await;
        if let EpisodeState::Refreshing { invalidated, .. } = &mut *state {
            debug!("session invalidated during refresh episode: reason={}", reason);
            *invalidated = true;
        }
        self.session.invalidate(reason);
    }

    async fn run_episode(&self, telemetry: RefreshTelemetry) {
        telemetry.emit_start();
        let result = self.refresher.refresh().await;

        // The store is written and the state reset under one lock, so a request that starts a
        // new episode after this point already sees the new pair.
        let (end, waiters) = {
            let mut state = self.state.lock().await;
            let (waiters, invalidated) = match std::mem::replace(&mut *state, EpisodeState::Idle) {
                EpisodeState::Refreshing {
                    waiters,
                    invalidated,
                    ..
                } => (waiters, invalidated),
                EpisodeState::Idle => (Vec::new(), false),
            };
            let end = match result {
                Ok(_) if invalidated => EpisodeEnd::Superseded(None),
                Err(err) if invalidated => EpisodeEnd::Superseded(Some(err)),
                Ok(update) => EpisodeEnd::Applied(self.session.apply_refresh(update)),
                Err(err) => EpisodeEnd::Failed(err),
            };
            (end, waiters)
        };

        match end {
            EpisodeEnd::Applied(tokens) => {
                telemetry.emit_success(waiters.len());
                self.session.refreshed(&tokens);
                for waiter in waiters {
                    debug!("replaying {}", waiter.label());
                    waiter.resume(RefreshOutcome::Refreshed);
                }
            }
            EpisodeEnd::Failed(err) => {
                telemetry.emit_failure(&err, waiters.len());
                self.session.invalidate(InvalidationReason::RefreshFailed);
                Self::fail_all(waiters);
            }
            EpisodeEnd::Superseded(err) => {
                let err = err.unwrap_or_else(|| {
                    Error::Refresh("session invalidated while refreshing".into())
                });
                telemetry.emit_failure(&err, waiters.len());
                Self::fail_all(waiters);
            }
        }
    }

    fn fail_all(waiters: Vec<PendingRequest>) {
        for waiter in waiters {
            waiter.resume(RefreshOutcome::Failed);
        }
    }
}
