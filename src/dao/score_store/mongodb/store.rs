use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{
    Client, Collection, Database,
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoScoreDocument, doc_id, doc_id_at_version},
};
use crate::dao::{
    models::MatchScoreEntity,
    score_store::{CommitOutcome, ScoreStore},
    storage::StorageResult,
};

const SCORE_COLLECTION_NAME: &str = "match_scores";
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Durable score store backed by MongoDB.
#[derive(Clone)]
pub struct MongoScoreStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoScoreStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;
        // Dashboards list live matches by status; `_id` already covers lookups.
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"status": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("score_status_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "status",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoScoreDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoScoreDocument>(SCORE_COLLECTION_NAME)
    }

    async fn create(&self, score: MatchScoreEntity) -> MongoResult<bool> {
        let match_id = score.match_id;
        let document: MongoScoreDocument = score.into();
        let collection = self.collection().await;

        match collection.insert_one(&document).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::SaveScore { match_id, source }),
        }
    }

    async fn find(&self, match_id: Uuid) -> MongoResult<Option<MatchScoreEntity>> {
        let collection = self.collection().await;

        let document = collection
            .find_one(doc_id(match_id))
            .await
            .map_err(|source| MongoDaoError::LoadScore { match_id, source })?;

        Ok(document.map(Into::into))
    }

    async fn compare_and_commit(
        &self,
        expected_version: u64,
        score: MatchScoreEntity,
    ) -> MongoResult<CommitOutcome> {
        let match_id = score.match_id;
        let document: MongoScoreDocument = score.into();
        let collection = self.collection().await;

        let result = collection
            .replace_one(doc_id_at_version(match_id, expected_version), &document)
            .await
            .map_err(|source| MongoDaoError::SaveScore { match_id, source })?;

        if result.matched_count == 1 {
            return Ok(CommitOutcome::Committed);
        }

        // The filtered replace missed: either a rival committed first or the
        // row never existed. Disambiguate with a plain read.
        match self.find(match_id).await? {
            Some(current) => Ok(CommitOutcome::Conflict {
                actual: current.version,
            }),
            None => Ok(CommitOutcome::Missing),
        }
    }
}

impl ScoreStore for MongoScoreStore {
    fn create(&self, score: MatchScoreEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.create(score).await.map_err(Into::into) })
    }

    fn get(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find(match_id).await.map_err(Into::into) })
    }

    fn compare_and_commit(
        &self,
        expected_version: u64,
        score: MatchScoreEntity,
    ) -> BoxFuture<'static, StorageResult<CommitOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .compare_and_commit(expected_version, score)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}
