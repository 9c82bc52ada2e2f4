//! Client error types.

use nostr_core::WireError;
use std::fmt;
use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("serialization error: {0}")]
    Wire(#[from] WireError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("not connected")]
    NotConnected,

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("timeout error: {0}")]
    Timeout(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[cfg(feature = "websocket")]
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("send failed on {}", BroadcastFailures(.failures))]
    Broadcast { failures: Vec<(String, ClientError)> },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Relay names that failed during a broadcast. Empty for other errors.
    pub fn failed_relays(&self) -> Vec<&str> {
        match self {
            Self::Broadcast { failures } => failures.iter().map(|(name, _)| name.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

struct BroadcastFailures<'a>(&'a [(String, ClientError)]);

impl fmt::Display for BroadcastFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (relay, error)) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{relay} ({error})")?;
        }
        Ok(())
    }
}

/// Client result type.
pub type Result<T> = std::result::Result<T, ClientError>;
