use thiserror::Error;

/// Wire codec error types
#[derive(Debug, Error)]
pub enum WireError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array")]
    NotAnArray,

    #[error("empty message array")]
    Empty,

    #[error("message type is not a string")]
    InvalidMessageType,

    #[error("slot {index} has an unexpected type: {source}")]
    Slot {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("slot {0} is not declared by this message")]
    UndeclaredSlot(usize),
}

pub type Result<T> = std::result::Result<T, WireError>;
