//! Version-gated score operations.
//!
//! Every mutation follows the same shape: read the current row, check the
//! caller's `expected_version` against it, run the pure engine, then hand the
//! successor state to the store's compare-and-commit. Only a committed write
//! reaches the fan-out and, for match start and completion, the booking
//! system.

use std::time::{Duration, SystemTime};

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{models::MatchScoreEntity, score_store::CommitOutcome},
    dto::score::{
        AdjustPointsRequest, FinishMatchRequest, FinishSetRequest, ScoreSnapshot,
        StartMatchRequest, TogglePauseRequest,
    },
    error::ServiceError,
    score::{
        SharedState,
        engine::{MatchScore, ScoreAction},
    },
    services::{match_sync, score_events},
};

const COMMIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetch the score of a match, creating a pristine row on first access.
///
/// Creation races resolve in the store: when two devices open the same match
/// simultaneously, one insert wins and the loser reads the winner's row back.
pub async fn get_or_create_score(
    state: &SharedState,
    match_id: Uuid,
) -> Result<ScoreSnapshot, ServiceError> {
    let store = state.require_score_store().await?;

    if let Some(entity) = store.get(match_id).await? {
        return Ok(MatchScore::from(entity).into());
    }

    let fresh = MatchScore::new(match_id);
    if store.create(fresh.clone().into()).await? {
        debug!(%match_id, "created pristine score row");
        return Ok(fresh.into());
    }

    // Lost the creation race; the winner's row is authoritative.
    let entity = store
        .get(match_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("score for match `{match_id}` not found")))?;
    Ok(MatchScore::from(entity).into())
}

/// Fetch the score of a match without creating one.
pub async fn get_score(
    state: &SharedState,
    match_id: Uuid,
) -> Result<ScoreSnapshot, ServiceError> {
    let store = state.require_score_store().await?;
    let entity = store
        .get(match_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("score for match `{match_id}` not found")))?;
    Ok(MatchScore::from(entity).into())
}

/// Start a match and notify the booking system that it is live.
pub async fn start_match(
    state: &SharedState,
    match_id: Uuid,
    request: StartMatchRequest,
) -> Result<ScoreSnapshot, ServiceError> {
    let snapshot = submit(state, match_id, request.expected_version, ScoreAction::Start).await?;

    match_sync::notify_match_started(state, match_id);

    Ok(snapshot)
}

/// Add or remove one point for a side.
pub async fn adjust_points(
    state: &SharedState,
    match_id: Uuid,
    request: AdjustPointsRequest,
) -> Result<ScoreSnapshot, ServiceError> {
    let action = ScoreAction::AdjustPoints {
        team: request.team,
        delta: request.delta,
    };
    submit(state, match_id, request.expected_version, action).await
}

/// Pause or resume a match.
pub async fn toggle_pause(
    state: &SharedState,
    match_id: Uuid,
    request: TogglePauseRequest,
) -> Result<ScoreSnapshot, ServiceError> {
    let action = ScoreAction::TogglePause {
        pause: request.pause,
    };
    submit(state, match_id, request.expected_version, action).await
}

/// Close the current set and open the next one.
pub async fn finish_set(
    state: &SharedState,
    match_id: Uuid,
    request: FinishSetRequest,
) -> Result<ScoreSnapshot, ServiceError> {
    let action = ScoreAction::FinishSet {
        winner: request.winner,
    };
    submit(state, match_id, request.expected_version, action).await
}

/// Finish a match and notify the booking system.
pub async fn finish_match(
    state: &SharedState,
    match_id: Uuid,
    request: FinishMatchRequest,
) -> Result<ScoreSnapshot, ServiceError> {
    let action = ScoreAction::FinishMatch {
        winner: request.winner,
    };
    let snapshot = submit(state, match_id, request.expected_version, action).await?;

    info!(%match_id, winner = ?request.winner, "match finished");
    match_sync::notify_match_completed(state, match_id, request.winner);

    Ok(snapshot)
}

/// Run one action through the read, engine, compare-and-commit pipeline.
///
/// The early version check turns an obviously stale submission into a
/// conflict before the engine runs; a submission that passes it can still
/// lose the commit race, which the store reports as [`CommitOutcome`].
async fn submit(
    state: &SharedState,
    match_id: Uuid,
    expected_version: u64,
    action: ScoreAction,
) -> Result<ScoreSnapshot, ServiceError> {
    let store = state.require_score_store().await?;

    let entity = store
        .get(match_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("score for match `{match_id}` not found")))?;
    let current = MatchScore::from(entity);

    if current.version != expected_version {
        return Err(ServiceError::VersionConflict {
            expected: expected_version,
            actual: current.version,
        });
    }

    let next = current.apply(&action, SystemTime::now())?;

    // A commit that exceeds the deadline has an unknown outcome; the caller
    // must re-fetch before submitting again.
    let outcome = tokio::time::timeout(
        COMMIT_TIMEOUT,
        store.compare_and_commit(expected_version, MatchScoreEntity::from(next.clone())),
    )
    .await
    .map_err(|_| ServiceError::Timeout)??;

    match outcome {
        CommitOutcome::Committed => {
            score_events::broadcast_score_changed(state, next.clone());
            Ok(next.into())
        }
        CommitOutcome::Conflict { actual } => Err(ServiceError::VersionConflict {
            expected: expected_version,
            actual,
        }),
        CommitOutcome::Missing => Err(ServiceError::NotFound(format!(
            "score for match `{match_id}` not found"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::BoxFuture;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        dao::score_store::memory::MemoryScoreStore,
        score::{
            AppState, DEFAULT_FANOUT_CAPACITY,
            engine::{MatchStatus, Team},
        },
        services::match_sync::{MatchLifecycle, MatchSyncError, NoopLifecycle},
    };

    #[derive(Debug, PartialEq)]
    enum LifecycleNotice {
        Started(Uuid),
        Completed(Uuid, Team),
    }

    struct RecordingLifecycle {
        tx: mpsc::UnboundedSender<LifecycleNotice>,
    }

    impl MatchLifecycle for RecordingLifecycle {
        fn match_started(&self, match_id: Uuid) -> BoxFuture<'static, Result<(), MatchSyncError>> {
            let tx = self.tx.clone();
            Box::pin(async move {
                let _ = tx.send(LifecycleNotice::Started(match_id));
                Ok(())
            })
        }

        fn match_completed(
            &self,
            match_id: Uuid,
            winner: Team,
        ) -> BoxFuture<'static, Result<(), MatchSyncError>> {
            let tx = self.tx.clone();
            Box::pin(async move {
                let _ = tx.send(LifecycleNotice::Completed(match_id, winner));
                Ok(())
            })
        }
    }

    async fn ready_state(lifecycle: Arc<dyn MatchLifecycle>) -> SharedState {
        let state = AppState::new(DEFAULT_FANOUT_CAPACITY, lifecycle);
        state
            .install_score_store(Arc::new(MemoryScoreStore::new()))
            .await;
        state
    }

    async fn state_with_noop() -> SharedState {
        ready_state(Arc::new(NoopLifecycle)).await
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let state = state_with_noop().await;
        let match_id = Uuid::new_v4();

        let first = get_or_create_score(&state, match_id).await.unwrap();
        assert_eq!(first.status, MatchStatus::NotStarted);
        assert_eq!(first.version, 0);

        let second = get_or_create_score(&state, match_id).await.unwrap();
        assert_eq!(second.version, 0);
    }

    #[tokio::test]
    async fn get_score_for_unknown_match_is_not_found() {
        let state = state_with_noop().await;
        let err = get_score(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn operations_without_store_fail_degraded() {
        let state = AppState::new(DEFAULT_FANOUT_CAPACITY, Arc::new(NoopLifecycle));
        let err = get_or_create_score(&state, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }

    #[tokio::test]
    async fn start_bumps_version_and_status() {
        let state = state_with_noop().await;
        let match_id = Uuid::new_v4();
        get_or_create_score(&state, match_id).await.unwrap();

        let snapshot = start_match(
            &state,
            match_id,
            StartMatchRequest {
                expected_version: 0,
            },
        )
        .await
        .unwrap();

        assert_eq!(snapshot.status, MatchStatus::InProgress);
        assert_eq!(snapshot.version, 1);
        assert!(snapshot.started_at.is_some());
    }

    #[tokio::test]
    async fn stale_expected_version_conflicts_without_writing() {
        let state = state_with_noop().await;
        let match_id = Uuid::new_v4();
        get_or_create_score(&state, match_id).await.unwrap();
        start_match(
            &state,
            match_id,
            StartMatchRequest {
                expected_version: 0,
            },
        )
        .await
        .unwrap();

        let err = adjust_points(
            &state,
            match_id,
            AdjustPointsRequest {
                expected_version: 0,
                team: Team::A,
                delta: 1,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::VersionConflict {
                expected: 0,
                actual: 1
            }
        ));

        // losing submission must not have changed anything
        let current = get_score(&state, match_id).await.unwrap();
        assert_eq!(current.version, 1);
        assert_eq!(current.team_a_points, 0);
    }

    #[tokio::test]
    async fn illegal_transition_maps_to_invalid_transition() {
        let state = state_with_noop().await;
        let match_id = Uuid::new_v4();
        get_or_create_score(&state, match_id).await.unwrap();

        let err = adjust_points(
            &state,
            match_id,
            AdjustPointsRequest {
                expected_version: 0,
                team: Team::B,
                delta: 1,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn committed_write_reaches_subscribers() {
        let state = state_with_noop().await;
        let match_id = Uuid::new_v4();
        get_or_create_score(&state, match_id).await.unwrap();

        let mut rx = state.fanout().subscribe(match_id);
        start_match(
            &state,
            match_id,
            StartMatchRequest {
                expected_version: 0,
            },
        )
        .await
        .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("score.changed"));
        let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["score"]["version"], 1);
        assert_eq!(payload["score"]["status"], "in_progress");
    }

    #[tokio::test]
    async fn rejected_write_emits_no_event() {
        let state = state_with_noop().await;
        let match_id = Uuid::new_v4();
        get_or_create_score(&state, match_id).await.unwrap();

        let mut rx = state.fanout().subscribe(match_id);
        let _ = start_match(
            &state,
            match_id,
            StartMatchRequest {
                expected_version: 7,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn full_match_flow_with_sets() {
        let state = state_with_noop().await;
        let match_id = Uuid::new_v4();
        get_or_create_score(&state, match_id).await.unwrap();

        let mut version = start_match(
            &state,
            match_id,
            StartMatchRequest {
                expected_version: 0,
            },
        )
        .await
        .unwrap()
        .version;

        for _ in 0..3 {
            version = adjust_points(
                &state,
                match_id,
                AdjustPointsRequest {
                    expected_version: version,
                    team: Team::A,
                    delta: 1,
                },
            )
            .await
            .unwrap()
            .version;
        }

        let after_set = finish_set(
            &state,
            match_id,
            FinishSetRequest {
                expected_version: version,
                winner: Team::A,
            },
        )
        .await
        .unwrap();
        assert_eq!(after_set.team_a_sets, 1);
        assert_eq!(after_set.current_set, 2);
        assert_eq!(after_set.sets_history.len(), 1);
        assert_eq!(after_set.sets_history[0].team_a_points, 3);

        let finished = finish_match(
            &state,
            match_id,
            FinishMatchRequest {
                expected_version: after_set.version,
                winner: Team::A,
            },
        )
        .await
        .unwrap();
        assert_eq!(finished.status, MatchStatus::Finished);
        assert_eq!(finished.winner_team, Some(Team::A));
        assert!(finished.finished_at.is_some());
    }

    #[tokio::test]
    async fn start_match_notifies_lifecycle() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let state = ready_state(Arc::new(RecordingLifecycle { tx })).await;
        let match_id = Uuid::new_v4();
        get_or_create_score(&state, match_id).await.unwrap();

        start_match(
            &state,
            match_id,
            StartMatchRequest {
                expected_version: 0,
            },
        )
        .await
        .unwrap();

        assert_eq!(rx.recv().await.unwrap(), LifecycleNotice::Started(match_id));
    }

    #[tokio::test]
    async fn rejected_start_notifies_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let state = ready_state(Arc::new(RecordingLifecycle { tx })).await;
        let match_id = Uuid::new_v4();
        get_or_create_score(&state, match_id).await.unwrap();

        let _ = start_match(
            &state,
            match_id,
            StartMatchRequest {
                expected_version: 9,
            },
        )
        .await
        .unwrap_err();

        tokio::task::yield_now().await;
        assert!(matches!(rx.try_recv(), Err(mpsc::error::TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn finish_match_notifies_lifecycle_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let state = ready_state(Arc::new(RecordingLifecycle { tx })).await;
        let match_id = Uuid::new_v4();
        get_or_create_score(&state, match_id).await.unwrap();
        start_match(
            &state,
            match_id,
            StartMatchRequest {
                expected_version: 0,
            },
        )
        .await
        .unwrap();

        finish_match(
            &state,
            match_id,
            FinishMatchRequest {
                expected_version: 1,
                winner: Team::B,
            },
        )
        .await
        .unwrap();

        assert_eq!(rx.recv().await.unwrap(), LifecycleNotice::Started(match_id));
        assert_eq!(
            rx.recv().await.unwrap(),
            LifecycleNotice::Completed(match_id, Team::B)
        );
        assert!(matches!(rx.try_recv(), Err(mpsc::error::TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn finish_match_retry_conflicts_instead_of_double_applying() {
        let state = state_with_noop().await;
        let match_id = Uuid::new_v4();
        get_or_create_score(&state, match_id).await.unwrap();
        start_match(
            &state,
            match_id,
            StartMatchRequest {
                expected_version: 0,
            },
        )
        .await
        .unwrap();

        let request = FinishMatchRequest {
            expected_version: 1,
            winner: Team::A,
        };
        finish_match(&state, match_id, request).await.unwrap();

        // a client retrying after a lost response re-sends the same payload
        let err = finish_match(
            &state,
            match_id,
            FinishMatchRequest {
                expected_version: 1,
                winner: Team::A,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::VersionConflict { .. }));

        let current = get_score(&state, match_id).await.unwrap();
        assert_eq!(current.version, 2);
        assert_eq!(current.status, MatchStatus::Finished);
    }
}
