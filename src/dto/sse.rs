use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::score::ScoreSnapshot;

#[derive(Clone, Debug)]
/// Dispatched payload carried across a per-match SSE channel.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from a pre-serialised data payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the match the stream is scoped to.
    pub match_id: Uuid,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after every committed score write for a match.
///
/// Carries the full post-commit snapshot so subscribers never have to apply
/// deltas; a client that missed events can simply adopt the latest one.
pub struct ScoreChangedEvent {
    pub score: ScoreSnapshot,
}
