//! Score store backends and the trait they implement.

pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::MatchScoreEntity;
use crate::dao::storage::StorageResult;

/// Result of a [`ScoreStore::compare_and_commit`] attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The persisted version matched and the new state is durable.
    Committed,
    /// Another writer committed first; nothing was written.
    Conflict {
        /// Version currently persisted for the match.
        actual: u64,
    },
    /// No row exists for the match; nothing was written.
    Missing,
}

/// Abstraction over the persistence layer for match scores.
///
/// `compare_and_commit` is the sole write path for existing rows: it must be
/// atomic (readers never observe partial field writes) and must reject the
/// write when the persisted `version` differs from `expected_version`. This
/// version gate is what keeps two scorekeepers' concurrent taps from
/// silently clobbering each other.
pub trait ScoreStore: Send + Sync {
    /// Insert a fresh score row. Returns `false` when the match already has
    /// one, leaving the existing row untouched.
    fn create(&self, score: MatchScoreEntity) -> BoxFuture<'static, StorageResult<bool>>;

    /// Fetch the score row of a match.
    fn get(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchScoreEntity>>>;

    /// Atomically replace the row if its persisted version still equals
    /// `expected_version`.
    fn compare_and_commit(
        &self,
        expected_version: u64,
        score: MatchScoreEntity,
    ) -> BoxFuture<'static, StorageResult<CommitOutcome>>;

    /// Cheap liveness probe used by the supervisor and the health route.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;

    /// Attempt to re-establish a dropped backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
