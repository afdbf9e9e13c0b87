use crate::types::RecordId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Invalid filter: {reason}")]
    InvalidFilter { reason: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),

    #[error("Record {id} is malformed: {reason}")]
    MalformedRecord { id: RecordId, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ListingError {
    pub fn invalid_filter(reason: impl Into<String>) -> Self {
        Self::InvalidFilter { reason: reason.into() }
    }
}

pub type ListingResult<T> = Result<T, ListingError>;
