use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::score::engine::{MatchScore, MatchStatus, SetRecord, Team};

/// Persisted representation of one match score row, keyed by `match_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchScoreEntity {
    /// Primary key; foreign key to the externally-owned match record.
    pub match_id: Uuid,
    /// Lifecycle status of the score.
    pub status: MatchStatus,
    /// Running points for team A within the current set.
    pub team_a_points: u32,
    /// Running points for team B within the current set.
    pub team_b_points: u32,
    /// Sets won by team A.
    pub team_a_sets: u32,
    /// Sets won by team B.
    pub team_b_sets: u32,
    /// 1-based number of the set being played.
    pub current_set: u32,
    /// Finalized sets, oldest first.
    pub sets_history: Vec<SetRecordEntity>,
    /// Winning side once the match is finished.
    pub winner: Option<Team>,
    /// Optimistic-concurrency token, +1 per committed write.
    pub version: u64,
    /// When the match went live, if it has.
    pub started_at: Option<SystemTime>,
    /// When the match finished, if it has.
    pub finished_at: Option<SystemTime>,
}

/// Persisted record of a completed set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetRecordEntity {
    /// 1-based number of the set within the match.
    pub set_number: u32,
    /// Team A points at set close.
    pub team_a_points: u32,
    /// Team B points at set close.
    pub team_b_points: u32,
    /// Side that took the set.
    pub winner: Team,
}

impl From<SetRecord> for SetRecordEntity {
    fn from(value: SetRecord) -> Self {
        Self {
            set_number: value.set_number,
            team_a_points: value.team_a_points,
            team_b_points: value.team_b_points,
            winner: value.winner,
        }
    }
}

impl From<SetRecordEntity> for SetRecord {
    fn from(value: SetRecordEntity) -> Self {
        Self {
            set_number: value.set_number,
            team_a_points: value.team_a_points,
            team_b_points: value.team_b_points,
            winner: value.winner,
        }
    }
}

impl From<MatchScore> for MatchScoreEntity {
    fn from(value: MatchScore) -> Self {
        Self {
            match_id: value.match_id,
            status: value.status,
            team_a_points: value.team_a_points,
            team_b_points: value.team_b_points,
            team_a_sets: value.team_a_sets,
            team_b_sets: value.team_b_sets,
            current_set: value.current_set,
            sets_history: value.sets_history.into_iter().map(Into::into).collect(),
            winner: value.winner,
            version: value.version,
            started_at: value.started_at,
            finished_at: value.finished_at,
        }
    }
}

impl From<MatchScoreEntity> for MatchScore {
    fn from(value: MatchScoreEntity) -> Self {
        Self {
            match_id: value.match_id,
            status: value.status,
            team_a_points: value.team_a_points,
            team_b_points: value.team_b_points,
            team_a_sets: value.team_a_sets,
            team_b_sets: value.team_b_sets,
            current_set: value.current_set,
            sets_history: value.sets_history.into_iter().map(Into::into).collect(),
            winner: value.winner,
            version: value.version,
            started_at: value.started_at,
            finished_at: value.finished_at,
        }
    }
}
