//! Transport boundary.
//!
//! A [`Communicator`] is a named, text-framed connection to one relay. The
//! relay client only needs to send text frames and observe inbound ones;
//! how the connection is made and kept alive is up to the implementation.

use crate::error::Result;
use crate::stream::MessageStream;

/// Why a connection (re)started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectionType {
    /// First successful connect after `start`.
    Initial,
    /// Connect after the previous connection was lost.
    Lost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectionInfo {
    pub kind: ReconnectionType,
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectionType {
    /// Closed by the remote side or dropped by the network.
    Lost,
    /// Closed through `stop`.
    ByUser,
    /// Failed with an error.
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectionInfo {
    pub kind: DisconnectionType,
}

/// The three streams every communicator exposes.
#[derive(Debug, Default)]
pub struct TransportStreams {
    pub message_received: MessageStream<String>,
    pub reconnection_happened: MessageStream<ReconnectionInfo>,
    pub disconnection_happened: MessageStream<DisconnectionInfo>,
}

/// A named text-frame connection to a single relay.
pub trait Communicator: Send + Sync {
    /// Connection name. Multi-relay lookups use it as the key.
    fn name(&self) -> &str;

    fn start(&self) -> Result<()>;

    fn stop(&self) -> Result<()>;

    fn is_running(&self) -> bool;

    /// Send one text frame.
    fn send(&self, text: &str) -> Result<()>;

    fn streams(&self) -> &TransportStreams;

    /// Inbound text frames.
    fn message_received(&self) -> &MessageStream<String> {
        &self.streams().message_received
    }

    fn reconnection_happened(&self) -> &MessageStream<ReconnectionInfo> {
        &self.streams().reconnection_happened
    }

    fn disconnection_happened(&self) -> &MessageStream<DisconnectionInfo> {
        &self.streams().disconnection_happened
    }
}
