use thiserror::Error;

use crate::dao::storage::StorageError;

/// Result alias for MongoDB-backed store operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Failures specific to the MongoDB backend, folded into [`StorageError`]
/// at the trait boundary.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("invalid MongoDB URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("constructing MongoDB client")]
    ClientConstruction {
        #[source]
        source: mongodb::error::Error,
    },
    #[error("initial MongoDB ping failed after {attempts} attempts")]
    InitialPing {
        attempts: u32,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("MongoDB health ping failed")]
    HealthPing {
        #[source]
        source: mongodb::error::Error,
    },
    #[error("loading `{collection}` document")]
    Load {
        collection: &'static str,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("saving `{collection}` document")]
    Save {
        collection: &'static str,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("whitelist row `{id}` is not a valid identity")]
    MalformedIdentity {
        id: String,
        #[source]
        source: uuid::Error,
    },
    #[error("reading icon file `{path}`")]
    IconRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::MalformedIdentity { .. } => {
                StorageError::Corrupt {
                    message: "whitelist document".into(),
                    source: Box::new(err),
                }
            }
            other => StorageError::Unavailable {
                message: other.to_string(),
                source: Box::new(other),
            },
        }
    }
}
