use crate::document::DocumentKey;
use flock_common::{model::ModelValidationError, snowflake::SnowflakeTimeError};
use thiserror::Error;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document {0} does not exist")]
    NotFound(DocumentKey),
    #[error("Precondition on document {0} failed")]
    PreconditionFailed(DocumentKey),
    #[error("Field {field} of document {key} is not a counter")]
    NotACounter { key: DocumentKey, field: String },
    #[error("The store is unavailable: {0}")]
    Unavailable(String),
    #[error("Transaction gave up after {0} attempts")]
    TooManyAttempts(u32),
    #[error("Document {key} does not match its schema: {source}")]
    Decode {
        key: DocumentKey,
        source: serde_json::Error,
    },
    #[error("Document {key} holds invalid data: {source}")]
    Data {
        key: DocumentKey,
        source: ModelValidationError,
    },
    #[error("A record could not be encoded: {0}")]
    Encode(serde_json::Error),
    #[error("Generating an id failed: {0}")]
    IdGeneration(#[from] SnowflakeTimeError),
}

impl StoreError {
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::PreconditionFailed(_))
    }
}
