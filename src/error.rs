//! Error taxonomy shared by the store, the driving operations and the API

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad user input, the operation was not started
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The entry at a positional index changed since the caller looked at it
    #[error("Entry {index} of {list} changed since it was displayed")]
    StaleIndex { list: String, index: usize },

    /// The profile collaborator raised while running an operation
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// The triggering control is still busy with a previous submission
    #[error("Busy: {0}")]
    Busy(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
