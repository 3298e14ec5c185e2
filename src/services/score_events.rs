use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        score::ScoreSnapshot,
        sse::{ScoreChangedEvent, ServerEvent, SystemStatus},
    },
    score::{SharedState, engine::MatchScore},
};

const EVENT_SCORE_CHANGED: &str = "score.changed";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the full post-commit snapshot to the match's subscribers.
pub fn broadcast_score_changed(state: &SharedState, score: MatchScore) {
    let match_id = score.match_id;
    let payload = ScoreChangedEvent {
        score: ScoreSnapshot::from(score),
    };
    send_match_event(state, match_id, EVENT_SCORE_CHANGED, &payload);
}

/// Forward degraded mode transitions to every live match stream.
///
/// Runs for the lifetime of the process; ends only when the state is dropped.
pub async fn forward_degraded_transitions(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    while watcher.changed().await.is_ok() {
        let degraded = *watcher.borrow_and_update();
        let payload = SystemStatus { degraded };
        match ServerEvent::json(Some(EVENT_SYSTEM_STATUS.to_string()), &payload) {
            Ok(event) => state.fanout().publish_all(event),
            Err(err) => warn!(error = %err, "failed to serialize SSE payload"),
        }
    }
}

fn send_match_event(state: &SharedState, match_id: Uuid, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.fanout().publish(match_id, event),
        Err(err) => warn!(%match_id, event, error = %err, "failed to serialize SSE payload"),
    }
}
