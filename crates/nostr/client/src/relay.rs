//! Single relay client.

use crate::communicator::Communicator;
use crate::error::{ClientError, Result};
use crate::stream::{MessageStream, StreamSubscription};
use crate::streams::{ClientStreams, Received};
use nostr_core::{ArrayMessage, CodecConfig, InboundFrame, WireCodec};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, warn};

/// Relay client configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelayClientConfig {
    pub codec: CodecConfig,
}

/// Decodes the frames of one communicator into typed streams and
/// serializes outbound messages onto it.
///
/// The client subscribes to the communicator's inbound stream on
/// construction and unsubscribes when dropped.
pub struct RelayClient {
    communicator: Arc<dyn Communicator>,
    codec: WireCodec,
    streams: Arc<ClientStreams>,
    _inbound: StreamSubscription,
}

impl RelayClient {
    /// Create a relay client with default config.
    pub fn new(communicator: Arc<dyn Communicator>) -> Self {
        Self::with_config(communicator, RelayClientConfig::default())
    }

    /// Create a relay client with custom config.
    pub fn with_config(communicator: Arc<dyn Communicator>, config: RelayClientConfig) -> Self {
        let codec = WireCodec::new(config.codec);
        let streams = Arc::new(ClientStreams::new());

        let relay_name = communicator.name().to_string();
        let dispatch_streams = Arc::clone(&streams);
        let inbound = communicator.message_received().subscribe(move |text: &String| {
            dispatch(&codec, &relay_name, &dispatch_streams, text);
        });

        Self {
            communicator,
            codec,
            streams,
            _inbound: inbound,
        }
    }

    /// Name of the underlying communicator.
    pub fn name(&self) -> &str {
        self.communicator.name()
    }

    pub fn communicator(&self) -> &Arc<dyn Communicator> {
        &self.communicator
    }

    pub fn codec(&self) -> WireCodec {
        self.codec
    }

    /// Typed inbound streams.
    pub fn streams(&self) -> &ClientStreams {
        &self.streams
    }

    /// Serialize a message and hand it to the communicator.
    ///
    /// Failures are logged with the message and returned to the caller.
    pub fn send<M: ArrayMessage + fmt::Debug>(&self, message: &M) -> Result<()> {
        let result = self
            .codec
            .serialize(message)
            .map_err(ClientError::from)
            .and_then(|text| self.communicator.send(&text));

        if let Err(error) = &result {
            error!(relay = %self.name(), ?message, %error, "failed to send message");
        }
        result
    }

    /// Feed one frame through the decoder as if the communicator had
    /// received it.
    pub fn handle_frame(&self, text: &str) {
        dispatch(&self.codec, self.name(), &self.streams, text);
    }
}

impl fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayClient")
            .field("name", &self.name())
            .field("codec", &self.codec)
            .finish()
    }
}

fn dispatch(codec: &WireCodec, relay_name: &str, streams: &ClientStreams, text: &str) {
    let received_at = SystemTime::now();
    match codec.decode_frame(text) {
        InboundFrame::Event(message) => {
            debug!(relay = relay_name, subscription = ?message.subscription_id, "EVENT");
            publish(streams.events(), relay_name, received_at, message);
        }
        InboundFrame::Eose(message) => {
            debug!(relay = relay_name, subscription = ?message.subscription_id, "EOSE");
            publish(streams.eose(), relay_name, received_at, message);
        }
        InboundFrame::Notice(message) => {
            debug!(relay = relay_name, notice = ?message.message, "NOTICE");
            publish(streams.notices(), relay_name, received_at, message);
        }
        InboundFrame::Ok(message) => {
            debug!(relay = relay_name, event_id = ?message.event_id, accepted = message.accepted, "OK");
            publish(streams.ok(), relay_name, received_at, message);
        }
        InboundFrame::Unknown(message) => {
            debug!(relay = relay_name, message_type = ?message.message_type, "unknown message type");
            publish(streams.unknown_messages(), relay_name, received_at, message);
        }
        InboundFrame::Raw(frame) => {
            warn!(relay = relay_name, error = ?frame.error, "undecodable frame routed to unknown-raw");
            publish(streams.unknown_raw(), relay_name, received_at, frame);
        }
    }
}

fn publish<T: 'static>(
    stream: &MessageStream<Received<T>>,
    relay_name: &str,
    received_at: SystemTime,
    message: T,
) {
    stream.publish(&Received::new(relay_name, received_at, message));
}
