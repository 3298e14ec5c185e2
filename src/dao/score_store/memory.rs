use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::MatchScoreEntity,
    score_store::{CommitOutcome, ScoreStore},
    storage::StorageResult,
};

/// In-memory score store used for single-node deployments and tests.
///
/// The map entry lock is the per-match critical section: a compare-and-commit
/// for one match holds its entry exclusively for the duration of the check
/// and swap, while commits against other matches proceed in parallel on
/// other shards. Rows are never deleted; finished scores remain as history.
#[derive(Clone, Default)]
pub struct MemoryScoreStore {
    scores: Arc<DashMap<Uuid, MatchScoreEntity>>,
}

impl MemoryScoreStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn create_sync(&self, score: MatchScoreEntity) -> bool {
        match self.scores.entry(score.match_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(score);
                true
            }
        }
    }

    fn get_sync(&self, match_id: Uuid) -> Option<MatchScoreEntity> {
        self.scores.get(&match_id).map(|row| row.clone())
    }

    fn compare_and_commit_sync(
        &self,
        expected_version: u64,
        score: MatchScoreEntity,
    ) -> CommitOutcome {
        match self.scores.entry(score.match_id) {
            Entry::Occupied(mut slot) => {
                let persisted = slot.get().version;
                if persisted == expected_version {
                    slot.insert(score);
                    CommitOutcome::Committed
                } else {
                    CommitOutcome::Conflict { actual: persisted }
                }
            }
            Entry::Vacant(_) => CommitOutcome::Missing,
        }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn create(&self, score: MatchScoreEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.create_sync(score)) })
    }

    fn get(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.get_sync(match_id)) })
    }

    fn compare_and_commit(
        &self,
        expected_version: u64,
        score: MatchScoreEntity,
    ) -> BoxFuture<'static, StorageResult<CommitOutcome>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.compare_and_commit_sync(expected_version, score)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
