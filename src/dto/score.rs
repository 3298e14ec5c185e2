use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{format_system_time, validation::validate_point_delta},
    score::engine::{MatchScore, MatchStatus, SetRecord, Team},
};

/// Public projection of a match score exposed to REST/SSE clients.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ScoreSnapshot {
    pub match_id: Uuid,
    pub team_a_points: u32,
    pub team_b_points: u32,
    pub team_a_sets: u32,
    pub team_b_sets: u32,
    pub current_set: u32,
    pub sets_history: Vec<SetRecordSummary>,
    pub status: MatchStatus,
    pub winner_team: Option<Team>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    /// Concurrency token; callers echo this back as `expected_version`.
    pub version: u64,
}

/// Projection of a completed set within a snapshot.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SetRecordSummary {
    pub set_number: u32,
    pub team_a_points: u32,
    pub team_b_points: u32,
    pub winner: Team,
}

impl From<SetRecord> for SetRecordSummary {
    fn from(record: SetRecord) -> Self {
        Self {
            set_number: record.set_number,
            team_a_points: record.team_a_points,
            team_b_points: record.team_b_points,
            winner: record.winner,
        }
    }
}

impl From<MatchScore> for ScoreSnapshot {
    fn from(score: MatchScore) -> Self {
        Self {
            match_id: score.match_id,
            team_a_points: score.team_a_points,
            team_b_points: score.team_b_points,
            team_a_sets: score.team_a_sets,
            team_b_sets: score.team_b_sets,
            current_set: score.current_set,
            sets_history: score.sets_history.into_iter().map(Into::into).collect(),
            status: score.status,
            winner_team: score.winner,
            started_at: score.started_at.map(format_system_time),
            finished_at: score.finished_at.map(format_system_time),
            version: score.version,
        }
    }
}

/// Payload used to start a match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StartMatchRequest {
    /// Version the caller last observed.
    pub expected_version: u64,
}

/// Payload used to adjust one team's points by a single point.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AdjustPointsRequest {
    /// Version the caller last observed.
    pub expected_version: u64,
    /// Team whose points change.
    pub team: Team,
    /// Point delta, restricted to `+1` or `-1`.
    #[validate(custom(function = validate_point_delta))]
    pub delta: i8,
}

/// Payload used to pause or resume a match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TogglePauseRequest {
    /// Version the caller last observed.
    pub expected_version: u64,
    /// `true` pauses a running match, `false` resumes a paused one.
    pub pause: bool,
}

/// Payload used to close the current set.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct FinishSetRequest {
    /// Version the caller last observed.
    pub expected_version: u64,
    /// Team that won the set.
    pub winner: Team,
}

/// Payload used to finish a match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct FinishMatchRequest {
    /// Version the caller last observed.
    pub expected_version: u64,
    /// Team that won the match.
    pub winner: Team,
}
