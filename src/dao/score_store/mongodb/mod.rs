//! MongoDB-backed score store. The compare-and-commit gate is expressed as a
//! `replace_one` filtered on both `_id` and `version`, so the swap is atomic
//! on the server side.

mod config;
mod connection;
mod error;
mod models;
mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoScoreStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
