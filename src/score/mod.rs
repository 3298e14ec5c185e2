//! Live score core: the pure engine, shared application state, the per-match
//! fan-out hub, and the client reconciliation contract.

pub mod engine;
pub mod fanout;
pub mod reconcile;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    dao::score_store::ScoreStore, error::ServiceError, services::match_sync::MatchLifecycle,
};

pub use self::fanout::ScoreFanout;

/// Cheaply clonable handle on the application state.
pub type SharedState = Arc<AppState>;

/// Default per-match broadcast channel capacity.
pub const DEFAULT_FANOUT_CAPACITY: usize = 16;

/// Central application state holding the store handle, the realtime fan-out
/// registry, and the external match lifecycle collaborator.
pub struct AppState {
    score_store: RwLock<Option<Arc<dyn ScoreStore>>>,
    fanout: ScoreFanout,
    match_sync: Arc<dyn MatchLifecycle>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned
    /// cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed.
    pub fn new(fanout_capacity: usize, match_sync: Arc<dyn MatchLifecycle>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            score_store: RwLock::new(None),
            fanout: ScoreFanout::new(fanout_capacity),
            match_sync,
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current score store, if one is installed.
    pub async fn score_store(&self) -> Option<Arc<dyn ScoreStore>> {
        let guard = self.score_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the score store or fail with [`ServiceError::Degraded`].
    pub async fn require_score_store(&self) -> Result<Arc<dyn ScoreStore>, ServiceError> {
        self.score_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn install_score_store(&self, store: Arc<dyn ScoreStore>) {
        {
            let mut guard = self.score_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current storage backend and enter degraded mode.
    pub async fn clear_score_store(&self) {
        {
            let mut guard = self.score_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Per-match broadcast registry for score change events.
    pub fn fanout(&self) -> &ScoreFanout {
        &self.fanout
    }

    /// External collaborator notified when a match finishes.
    pub fn match_sync(&self) -> Arc<dyn MatchLifecycle> {
        self.match_sync.clone()
    }
}
