use thiserror::Error;
use uuid::Uuid;

/// Result alias for MongoDB DAO operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Errors raised by the MongoDB score store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection string could not be parsed.
    #[error("invalid MongoDB connection string `{uri}`")]
    InvalidUri {
        /// The offending URI.
        uri: String,
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// A required environment variable is absent.
    #[error("missing environment variable {var}")]
    MissingEnvVar {
        /// Name of the missing variable.
        var: &'static str,
    },
    /// The driver client could not be constructed.
    #[error("failed to construct MongoDB client")]
    ClientConstruction {
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// The database never answered the initial ping.
    #[error("MongoDB did not answer the initial ping after {attempts} attempts")]
    InitialPing {
        /// Number of pings sent before giving up.
        attempts: u32,
        /// Driver-level cause of the last attempt.
        #[source]
        source: mongodb::error::Error,
    },
    /// A routine health ping failed.
    #[error("MongoDB health ping failed")]
    HealthPing {
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// Writing a score row failed.
    #[error("failed to save score for match {match_id}")]
    SaveScore {
        /// Match whose row was being written.
        match_id: Uuid,
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// Reading a score row failed.
    #[error("failed to load score for match {match_id}")]
    LoadScore {
        /// Match whose row was being read.
        match_id: Uuid,
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// Index creation failed during startup.
    #[error("failed to ensure index `{index}` on {collection}")]
    EnsureIndex {
        /// Target collection.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
}
