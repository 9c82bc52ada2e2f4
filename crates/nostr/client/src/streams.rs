//! Typed inbound streams.

use crate::stream::MessageStream;
use nostr_core::{EoseResponse, EventResponse, NoticeResponse, OkResponse, RawFrame, UnknownMessage};
use std::time::SystemTime;

/// A decoded relay message, tagged with where and when it arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct Received<T> {
    /// Name of the communicator the frame came from
    pub relay_name: String,
    pub received_at: SystemTime,
    pub message: T,
}

impl<T> Received<T> {
    pub fn new(relay_name: impl Into<String>, received_at: SystemTime, message: T) -> Self {
        Self {
            relay_name: relay_name.into(),
            received_at,
            message,
        }
    }
}

/// One stream per inbound message category.
#[derive(Debug, Default)]
pub struct ClientStreams {
    events: MessageStream<Received<EventResponse>>,
    notices: MessageStream<Received<NoticeResponse>>,
    eose: MessageStream<Received<EoseResponse>>,
    ok: MessageStream<Received<OkResponse>>,
    unknown_messages: MessageStream<Received<UnknownMessage>>,
    unknown_raw: MessageStream<Received<RawFrame>>,
}

impl ClientStreams {
    pub fn new() -> Self {
        Self::default()
    }

    /// `EVENT` frames.
    pub fn events(&self) -> &MessageStream<Received<EventResponse>> {
        &self.events
    }

    /// `NOTICE` frames.
    pub fn notices(&self) -> &MessageStream<Received<NoticeResponse>> {
        &self.notices
    }

    /// `EOSE` frames.
    pub fn eose(&self) -> &MessageStream<Received<EoseResponse>> {
        &self.eose
    }

    /// `OK` frames.
    pub fn ok(&self) -> &MessageStream<Received<OkResponse>> {
        &self.ok
    }

    /// Well-formed arrays with an unrecognized message type.
    pub fn unknown_messages(&self) -> &MessageStream<Received<UnknownMessage>> {
        &self.unknown_messages
    }

    /// Frames that could not be decoded at all.
    pub fn unknown_raw(&self) -> &MessageStream<Received<RawFrame>> {
        &self.unknown_raw
    }
}
