//! Error types for state store operations

use thiserror::Error;

/// Errors that can occur when recording job state
#[derive(Error, Debug)]
pub enum StateStoreError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("state endpoint returned status {0}")]
    Endpoint(u16),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StateStoreError>;
