use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// One of the two sides competing in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// Home side (`"a"` on the wire).
    A,
    /// Away side (`"b"` on the wire).
    B,
}

/// Lifecycle status of a match score.
///
/// Legal flow is `NotStarted → InProgress ⇄ Paused → Finished`; `Finished`
/// is terminal and a match must pass through `InProgress` at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Scoreboard exists but the match has not begun.
    NotStarted,
    /// Match is live; points can be scored.
    InProgress,
    /// Match is temporarily halted.
    Paused,
    /// Match is over; the record is immutable history.
    Finished,
}

/// A finalized set. Once appended to the history it is never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRecord {
    /// 1-based number of the set within the match.
    pub set_number: u32,
    /// Points team A held when the set closed.
    pub team_a_points: u32,
    /// Points team B held when the set closed.
    pub team_b_points: u32,
    /// Side that took the set.
    pub winner: Team,
}

/// Authoritative score of a single match.
///
/// Mutated exclusively through [`MatchScore::apply`]; the `version` field is
/// the optimistic-concurrency token checked by the store on every commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchScore {
    /// Identifier of the match this score belongs to (1:1).
    pub match_id: Uuid,
    /// Current lifecycle status.
    pub status: MatchStatus,
    /// Running points for team A within the current set.
    pub team_a_points: u32,
    /// Running points for team B within the current set.
    pub team_b_points: u32,
    /// Sets won by team A so far.
    pub team_a_sets: u32,
    /// Sets won by team B so far.
    pub team_b_sets: u32,
    /// 1-based number of the set currently being played. Never decreases.
    pub current_set: u32,
    /// Append-only record of completed sets.
    pub sets_history: Vec<SetRecord>,
    /// Winning side, set exactly once when the match finishes.
    pub winner: Option<Team>,
    /// Monotonically increasing commit counter; +1 per committed mutation.
    pub version: u64,
    /// Set exactly once on the `NotStarted → InProgress` transition.
    pub started_at: Option<SystemTime>,
    /// Set exactly once on the transition to `Finished`.
    pub finished_at: Option<SystemTime>,
}

/// Score-changing action submitted by a scorekeeper device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreAction {
    /// Begin the match.
    Start,
    /// Add or remove a single point for one side.
    AdjustPoints {
        /// Side whose counter changes.
        team: Team,
        /// Must be `+1` or `-1`; the result is clamped at zero.
        delta: i8,
    },
    /// Pause (`true`) or resume (`false`) a live match.
    TogglePause {
        /// Target paused state; must differ from the current one.
        pause: bool,
    },
    /// Close the current set in favour of `winner` and open the next one.
    FinishSet {
        /// Side that took the set.
        winner: Team,
    },
    /// End the match in favour of `winner`.
    FinishMatch {
        /// Side that won the match.
        winner: Team,
    },
}

/// Error returned when an action cannot be applied to the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The action is not legal while the score is in `from`.
    #[error("invalid transition: {action:?} cannot be applied while {from:?}")]
    InvalidTransition {
        /// Status the score was in when the action arrived.
        from: MatchStatus,
        /// The rejected action.
        action: ScoreAction,
    },
    /// The action payload is malformed regardless of state.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl MatchScore {
    /// Fresh scoreboard for a scheduled match: not started, version 0.
    pub fn new(match_id: Uuid) -> Self {
        Self {
            match_id,
            status: MatchStatus::NotStarted,
            team_a_points: 0,
            team_b_points: 0,
            team_a_sets: 0,
            team_b_sets: 0,
            current_set: 1,
            sets_history: Vec::new(),
            winner: None,
            version: 0,
            started_at: None,
            finished_at: None,
        }
    }

    /// Apply a scorekeeper action, producing the successor state.
    ///
    /// This is a pure function: the only external input is `now`, used solely
    /// to stamp `started_at` / `finished_at`. Every successful application
    /// bumps `version` by exactly one; failures leave `self` untouched.
    pub fn apply(&self, action: &ScoreAction, now: SystemTime) -> Result<MatchScore, EngineError> {
        let mut next = self.clone();

        match (self.status, action) {
            (MatchStatus::NotStarted, ScoreAction::Start) => {
                next.status = MatchStatus::InProgress;
                next.started_at = Some(now);
            }
            (MatchStatus::InProgress, ScoreAction::AdjustPoints { team, delta }) => {
                if !matches!(delta, 1 | -1) {
                    return Err(EngineError::InvalidArgument(format!(
                        "point delta must be +1 or -1, got {delta}"
                    )));
                }
                let counter = match team {
                    Team::A => &mut next.team_a_points,
                    Team::B => &mut next.team_b_points,
                };
                // Points never go negative: removing from zero is a no-op.
                *counter = counter.saturating_add_signed(i32::from(*delta));
            }
            (MatchStatus::InProgress, ScoreAction::TogglePause { pause: true }) => {
                next.status = MatchStatus::Paused;
            }
            (MatchStatus::Paused, ScoreAction::TogglePause { pause: false }) => {
                next.status = MatchStatus::InProgress;
            }
            (MatchStatus::InProgress, ScoreAction::FinishSet { winner }) => {
                next.sets_history.push(SetRecord {
                    set_number: self.current_set,
                    team_a_points: self.team_a_points,
                    team_b_points: self.team_b_points,
                    winner: *winner,
                });
                match winner {
                    Team::A => next.team_a_sets += 1,
                    Team::B => next.team_b_sets += 1,
                }
                next.team_a_points = 0;
                next.team_b_points = 0;
                next.current_set += 1;
            }
            (
                MatchStatus::InProgress | MatchStatus::Paused,
                ScoreAction::FinishMatch { winner },
            ) => {
                next.status = MatchStatus::Finished;
                next.winner = Some(*winner);
                next.finished_at = Some(now);
            }
            (from, action) => {
                return Err(EngineError::InvalidTransition {
                    from,
                    action: *action,
                });
            }
        }

        next.version = self.version + 1;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH
    }

    fn apply(score: &MatchScore, action: ScoreAction) -> MatchScore {
        score.apply(&action, now()).unwrap()
    }

    fn live_score() -> MatchScore {
        apply(&MatchScore::new(Uuid::new_v4()), ScoreAction::Start)
    }

    #[test]
    fn new_score_is_pristine() {
        let score = MatchScore::new(Uuid::new_v4());
        assert_eq!(score.status, MatchStatus::NotStarted);
        assert_eq!(score.version, 0);
        assert_eq!(score.current_set, 1);
        assert!(score.sets_history.is_empty());
        assert!(score.started_at.is_none());
    }

    #[test]
    fn start_transitions_and_stamps() {
        let score = live_score();
        assert_eq!(score.status, MatchStatus::InProgress);
        assert_eq!(score.version, 1);
        assert!(score.started_at.is_some());
    }

    #[test]
    fn start_twice_is_rejected() {
        let score = live_score();
        let err = score.apply(&ScoreAction::Start, now()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition {
                from: MatchStatus::InProgress,
                ..
            }
        ));
    }

    #[test]
    fn adjust_requires_in_progress() {
        let action = ScoreAction::AdjustPoints {
            team: Team::A,
            delta: 1,
        };

        let fresh = MatchScore::new(Uuid::new_v4());
        assert!(fresh.apply(&action, now()).is_err());

        let paused = apply(&live_score(), ScoreAction::TogglePause { pause: true });
        assert!(paused.apply(&action, now()).is_err());
    }

    #[test]
    fn adjust_rejects_out_of_range_deltas() {
        let score = live_score();
        for delta in [0, 2, -2, 5] {
            let err = score
                .apply(
                    &ScoreAction::AdjustPoints {
                        team: Team::B,
                        delta,
                    },
                    now(),
                )
                .unwrap_err();
            assert!(matches!(err, EngineError::InvalidArgument(_)), "{delta}");
        }
    }

    #[test]
    fn points_clamp_at_zero() {
        let score = live_score();
        let after = apply(
            &score,
            ScoreAction::AdjustPoints {
                team: Team::A,
                delta: -1,
            },
        );
        assert_eq!(after.team_a_points, 0);
        assert_eq!(after.version, score.version + 1);
    }

    #[test]
    fn point_sequence_matches_clamped_fold() {
        let deltas: [i8; 9] = [1, 1, -1, -1, -1, 1, 1, 1, -1];
        let mut score = live_score();
        let mut expected: i64 = 0;
        for delta in deltas {
            score = apply(
                &score,
                ScoreAction::AdjustPoints {
                    team: Team::B,
                    delta,
                },
            );
            expected = (expected + i64::from(delta)).max(0);
            assert_eq!(i64::from(score.team_b_points), expected);
        }
        // one version bump per applied delta
        assert_eq!(score.version, 1 + deltas.len() as u64);
    }

    #[test]
    fn pause_and_resume_round_trip() {
        let paused = apply(&live_score(), ScoreAction::TogglePause { pause: true });
        assert_eq!(paused.status, MatchStatus::Paused);

        let resumed = apply(&paused, ScoreAction::TogglePause { pause: false });
        assert_eq!(resumed.status, MatchStatus::InProgress);
    }

    #[test]
    fn pause_into_current_state_is_rejected() {
        let live = live_score();
        assert!(
            live.apply(&ScoreAction::TogglePause { pause: false }, now())
                .is_err()
        );

        let paused = apply(&live, ScoreAction::TogglePause { pause: true });
        assert!(
            paused
                .apply(&ScoreAction::TogglePause { pause: true }, now())
                .is_err()
        );
    }

    #[test]
    fn finish_set_archives_and_resets() {
        let mut score = live_score();
        for _ in 0..3 {
            score = apply(
                &score,
                ScoreAction::AdjustPoints {
                    team: Team::A,
                    delta: 1,
                },
            );
        }
        score = apply(
            &score,
            ScoreAction::AdjustPoints {
                team: Team::B,
                delta: 1,
            },
        );

        let after = apply(&score, ScoreAction::FinishSet { winner: Team::A });
        assert_eq!(
            after.sets_history,
            vec![SetRecord {
                set_number: 1,
                team_a_points: 3,
                team_b_points: 1,
                winner: Team::A,
            }]
        );
        assert_eq!(after.team_a_sets, 1);
        assert_eq!(after.team_b_sets, 0);
        assert_eq!(after.team_a_points, 0);
        assert_eq!(after.team_b_points, 0);
        assert_eq!(after.current_set, 2);
        assert_eq!(
            after.sets_history.len() as u32,
            after.team_a_sets + after.team_b_sets
        );
    }

    #[test]
    fn finish_set_requires_in_progress() {
        let paused = apply(&live_score(), ScoreAction::TogglePause { pause: true });
        assert!(
            paused
                .apply(&ScoreAction::FinishSet { winner: Team::B }, now())
                .is_err()
        );
    }

    #[test]
    fn finish_match_from_in_progress_or_paused() {
        let finished = apply(&live_score(), ScoreAction::FinishMatch { winner: Team::B });
        assert_eq!(finished.status, MatchStatus::Finished);
        assert_eq!(finished.winner, Some(Team::B));
        assert!(finished.finished_at.is_some());

        let paused = apply(&live_score(), ScoreAction::TogglePause { pause: true });
        let finished = apply(&paused, ScoreAction::FinishMatch { winner: Team::A });
        assert_eq!(finished.winner, Some(Team::A));
    }

    #[test]
    fn finish_match_unreachable_from_not_started() {
        let fresh = MatchScore::new(Uuid::new_v4());
        let err = fresh
            .apply(&ScoreAction::FinishMatch { winner: Team::A }, now())
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition {
                from: MatchStatus::NotStarted,
                ..
            }
        ));
        // the failed call must not have mutated anything
        assert_eq!(fresh, MatchScore::new(fresh.match_id));
    }

    #[test]
    fn finished_is_terminal() {
        let finished = apply(&live_score(), ScoreAction::FinishMatch { winner: Team::A });
        let actions = [
            ScoreAction::Start,
            ScoreAction::AdjustPoints {
                team: Team::A,
                delta: 1,
            },
            ScoreAction::TogglePause { pause: true },
            ScoreAction::TogglePause { pause: false },
            ScoreAction::FinishSet { winner: Team::A },
            ScoreAction::FinishMatch { winner: Team::B },
        ];
        for action in actions {
            let err = finished.apply(&action, now()).unwrap_err();
            assert!(
                matches!(
                    err,
                    EngineError::InvalidTransition {
                        from: MatchStatus::Finished,
                        ..
                    }
                ),
                "{action:?}"
            );
        }
    }

    #[test]
    fn full_match_version_trace() {
        let mut score = MatchScore::new(Uuid::new_v4());
        score = apply(&score, ScoreAction::Start);
        assert_eq!((score.status, score.version), (MatchStatus::InProgress, 1));

        for _ in 0..4 {
            score = apply(
                &score,
                ScoreAction::AdjustPoints {
                    team: Team::A,
                    delta: 1,
                },
            );
        }
        for _ in 0..2 {
            score = apply(
                &score,
                ScoreAction::AdjustPoints {
                    team: Team::B,
                    delta: 1,
                },
            );
        }
        assert_eq!(score.team_a_points, 4);
        assert_eq!(score.team_b_points, 2);
        assert_eq!(score.version, 7);

        score = apply(&score, ScoreAction::FinishSet { winner: Team::A });
        assert_eq!(score.version, 8);
        assert_eq!(score.team_a_sets, 1);
        assert_eq!(score.current_set, 2);

        // second set, also taken by A
        for _ in 0..3 {
            score = apply(
                &score,
                ScoreAction::AdjustPoints {
                    team: Team::A,
                    delta: 1,
                },
            );
        }
        score = apply(&score, ScoreAction::FinishSet { winner: Team::A });
        assert_eq!(score.team_a_sets, 2);
        assert_eq!(score.sets_history.len(), 2);

        let final_version = score.version;
        score = apply(&score, ScoreAction::FinishMatch { winner: Team::A });
        assert_eq!(score.status, MatchStatus::Finished);
        assert_eq!(score.winner, Some(Team::A));
        assert_eq!(score.version, final_version + 1);
    }
}
