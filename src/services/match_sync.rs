//! Outbound notifications keeping the booking system's match record in step.
//!
//! The scoring core owns the score row only; the surrounding booking system
//! owns the match record. When a match goes live or reaches its terminal
//! status we tell that system once, after the commit, and never let its
//! availability affect the commit itself.

use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::score::{SharedState, engine::Team};

/// Errors raised while notifying the match owner.
#[derive(Debug, Error)]
pub enum MatchSyncError {
    /// The notification transport failed.
    #[error("match lifecycle notification failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// The endpoint answered with a non-success status.
    #[error("match lifecycle endpoint answered {status}")]
    Rejected {
        /// HTTP status returned by the endpoint.
        status: u16,
    },
}

/// Collaborator owning the match record, notified when scoring goes live and
/// when it completes.
pub trait MatchLifecycle: Send + Sync {
    /// Report that scoring for `match_id` has started.
    fn match_started(&self, match_id: Uuid) -> BoxFuture<'static, Result<(), MatchSyncError>>;

    /// Report that `match_id` finished with `winner` taking the match.
    fn match_completed(
        &self,
        match_id: Uuid,
        winner: Team,
    ) -> BoxFuture<'static, Result<(), MatchSyncError>>;
}

/// Lifecycle sink used when no endpoint is configured and in tests.
#[derive(Default)]
pub struct NoopLifecycle;

impl MatchLifecycle for NoopLifecycle {
    fn match_started(&self, match_id: Uuid) -> BoxFuture<'static, Result<(), MatchSyncError>> {
        Box::pin(async move {
            info!(%match_id, "match started (no lifecycle endpoint configured)");
            Ok(())
        })
    }

    fn match_completed(
        &self,
        match_id: Uuid,
        winner: Team,
    ) -> BoxFuture<'static, Result<(), MatchSyncError>> {
        Box::pin(async move {
            info!(%match_id, ?winner, "match completed (no lifecycle endpoint configured)");
            Ok(())
        })
    }
}

#[derive(Serialize)]
struct MatchStartedPayload {
    match_id: Uuid,
    status: &'static str,
}

#[derive(Serialize)]
struct MatchCompletedPayload {
    match_id: Uuid,
    status: &'static str,
    winner_team: Team,
}

/// Lifecycle sink that POSTs status notices to an HTTP endpoint.
pub struct WebhookLifecycle {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookLifecycle {
    /// Build a webhook sink targeting `endpoint`.
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

impl WebhookLifecycle {
    async fn post<T: Serialize>(
        client: reqwest::Client,
        endpoint: String,
        payload: T,
    ) -> Result<(), MatchSyncError> {
        let response = client
            .post(&endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(MatchSyncError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(MatchSyncError::Rejected {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

impl MatchLifecycle for WebhookLifecycle {
    fn match_started(&self, match_id: Uuid) -> BoxFuture<'static, Result<(), MatchSyncError>> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        Box::pin(Self::post(
            client,
            endpoint,
            MatchStartedPayload {
                match_id,
                status: "in_progress",
            },
        ))
    }

    fn match_completed(
        &self,
        match_id: Uuid,
        winner: Team,
    ) -> BoxFuture<'static, Result<(), MatchSyncError>> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        Box::pin(Self::post(
            client,
            endpoint,
            MatchCompletedPayload {
                match_id,
                status: "completed",
                winner_team: winner,
            },
        ))
    }
}

/// Fire-and-forget start notice.
///
/// Runs on a detached task so the commit path never waits on the booking
/// system; a failure is logged and the score row stays live regardless.
pub fn notify_match_started(state: &SharedState, match_id: Uuid) {
    let lifecycle = state.match_sync();
    tokio::spawn(async move {
        if let Err(err) = lifecycle.match_started(match_id).await {
            warn!(%match_id, error = %err, "match start notice failed");
        }
    });
}

/// Fire-and-forget completion notice.
///
/// Runs on a detached task so the commit path never waits on the booking
/// system; a failure is logged and the score row stays finished regardless.
pub fn notify_match_completed(state: &SharedState, match_id: Uuid, winner: Team) {
    let lifecycle = state.match_sync();
    tokio::spawn(async move {
        if let Err(err) = lifecycle.match_completed(match_id, winner).await {
            warn!(%match_id, error = %err, "match completion notice failed");
        }
    });
}
