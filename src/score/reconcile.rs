use std::time::SystemTime;

use crate::score::engine::{EngineError, MatchScore, ScoreAction};

/// Client-side view of a match score, reconciling optimistic local taps with
/// the authoritative states pushed by the backend.
///
/// Every screen that displays or edits a score follows the same rules:
/// an action is applied locally first for responsiveness and submitted with
/// the last confirmed `version`; any authoritative state carrying a higher
/// version replaces the local view wholesale (never a field-level merge);
/// a rejected write discards the optimistic layer instead of retrying with a
/// bumped version, which could apply the same tap twice.
#[derive(Debug, Clone)]
pub struct ScoreView {
    confirmed: MatchScore,
    optimistic: Option<MatchScore>,
}

impl ScoreView {
    /// Start from an authoritative state fetched at screen load.
    pub fn new(initial: MatchScore) -> Self {
        Self {
            confirmed: initial,
            optimistic: None,
        }
    }

    /// State the UI should render: the optimistic layer when present,
    /// otherwise the last confirmed one.
    pub fn displayed(&self) -> &MatchScore {
        self.optimistic.as_ref().unwrap_or(&self.confirmed)
    }

    /// Version of the last authoritative state this view has adopted.
    pub fn confirmed_version(&self) -> u64 {
        self.confirmed.version
    }

    /// Apply an action locally ahead of server acknowledgment.
    ///
    /// The optimistic result is computed with the same pure engine the server
    /// runs, against the last confirmed state. Returns the `expected_version`
    /// the caller must attach to the write. Restaging replaces any previous
    /// unacknowledged layer.
    pub fn stage(&mut self, action: &ScoreAction, now: SystemTime) -> Result<u64, EngineError> {
        let next = self.confirmed.apply(action, now)?;
        self.optimistic = Some(next);
        Ok(self.confirmed.version)
    }

    /// Discard the optimistic layer after a `VersionConflict` or an unknown
    /// write outcome. The UI falls back to the confirmed state until the
    /// mandatory re-fetch lands in [`ScoreView::observe`].
    pub fn rollback(&mut self) {
        self.optimistic = None;
    }

    /// Merge an authoritative state, whether it arrived as a change event or
    /// as the response to a re-fetch.
    ///
    /// The state is adopted wholesale only when its version is higher than
    /// the confirmed one, so an event racing a `GET` (in either order) can
    /// never roll the view back. Returns whether the view changed.
    pub fn observe(&mut self, authoritative: MatchScore) -> bool {
        if authoritative.version <= self.confirmed.version {
            return false;
        }
        self.confirmed = authoritative;
        self.optimistic = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::engine::Team;
    use uuid::Uuid;

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH
    }

    fn live_score() -> MatchScore {
        MatchScore::new(Uuid::new_v4())
            .apply(&ScoreAction::Start, now())
            .unwrap()
    }

    fn tap(team: Team) -> ScoreAction {
        ScoreAction::AdjustPoints { team, delta: 1 }
    }

    #[test]
    fn staged_tap_shows_immediately_with_confirmed_expected_version() {
        let score = live_score();
        let mut view = ScoreView::new(score.clone());

        let expected = view.stage(&tap(Team::A), now()).unwrap();
        assert_eq!(expected, score.version);
        assert_eq!(view.displayed().team_a_points, 1);
        assert_eq!(view.confirmed_version(), score.version);
    }

    #[test]
    fn conflict_rolls_back_to_confirmed_state() {
        let score = live_score();
        let mut view = ScoreView::new(score.clone());
        view.stage(&tap(Team::A), now()).unwrap();

        // the write lost the race; the local tap reverts
        view.rollback();
        assert_eq!(view.displayed(), &score);

        // mandatory re-fetch brings the winning writer's state
        let other_writer = score.apply(&tap(Team::B), now()).unwrap();
        assert!(view.observe(other_writer.clone()));
        assert_eq!(view.displayed(), &other_writer);
    }

    #[test]
    fn newer_event_replaces_view_wholesale() {
        let score = live_score();
        let mut view = ScoreView::new(score.clone());
        view.stage(&tap(Team::A), now()).unwrap();

        let mut authoritative = score;
        for _ in 0..3 {
            authoritative = authoritative.apply(&tap(Team::B), now()).unwrap();
        }

        assert!(view.observe(authoritative.clone()));
        // no merge of the optimistic layer into the server result
        assert_eq!(view.displayed(), &authoritative);
    }

    #[test]
    fn stale_event_after_refetch_is_ignored() {
        let score = live_score();
        let v2 = score.apply(&tap(Team::A), now()).unwrap();
        let v3 = v2.apply(&tap(Team::A), now()).unwrap();

        // GET returned v3 before the v2 event was delivered
        let mut view = ScoreView::new(v3.clone());
        assert!(!view.observe(v2));
        assert_eq!(view.displayed(), &v3);
    }

    #[test]
    fn confirmed_version_never_decreases() {
        let score = live_score();
        let mut view = ScoreView::new(score.clone());
        let mut authoritative = score;
        let mut last_seen = view.confirmed_version();

        for _ in 0..5 {
            authoritative = authoritative.apply(&tap(Team::A), now()).unwrap();
            view.observe(authoritative.clone());
            assert!(view.confirmed_version() >= last_seen);
            last_seen = view.confirmed_version();
        }

        // a reconnecting subscriber re-fetches; the result is at least as new
        assert!(authoritative.version >= last_seen);
    }
}
