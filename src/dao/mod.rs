//! Persistence layer: score entities, the store abstraction, and backends.

pub mod models;
pub mod score_store;
pub mod storage;
