//! Nostr relay clients with typed message streams.
//!
//! - [`RelayClient`] decodes the frames of one [`Communicator`] into typed
//!   streams and serializes outbound messages onto it.
//! - [`MultiRelayClient`] broadcasts to many relay clients and merges their
//!   streams, keeping the relay name on every item.
//! - [`WebsocketCommunicator`] (feature `websocket`) is the network
//!   transport. Anything implementing [`Communicator`] works in its place;
//!   [`testing::FakeCommunicator`] is an in-memory one.

pub mod communicator;
pub mod error;
pub mod multi;
pub mod relay;
pub mod stream;
pub mod streams;
pub mod testing;
#[cfg(feature = "websocket")]
pub mod websocket;

pub use communicator::{
    Communicator, DisconnectionInfo, DisconnectionType, ReconnectionInfo, ReconnectionType,
    TransportStreams,
};
pub use error::{ClientError, Result};
pub use multi::MultiRelayClient;
pub use relay::{RelayClient, RelayClientConfig};
pub use stream::{MessageStream, StreamSubscription};
pub use streams::{ClientStreams, Received};
#[cfg(feature = "websocket")]
pub use websocket::{WebsocketCommunicator, WebsocketConfig};
