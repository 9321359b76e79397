use std::path::PathBuf;

use routinely_core::types::DbId;

/// Errors raised by snapshot providers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("{entity} with id {id} already exists")]
    Duplicate { entity: &'static str, id: DbId },

    #[error("Invalid {entity} {id}: {message}")]
    Invalid {
        entity: &'static str,
        id: DbId,
        message: String,
    },

    #[error("Failed to read seed file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse seed data: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
