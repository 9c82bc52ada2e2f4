//! Relay protocol messages.
//!
//! Every frame on the wire is a JSON array whose first element names the
//! message type. Messages model their leading positions as typed fields and
//! keep anything after them in an additional-data tail, so frames from newer
//! relays survive a decode/encode pass.
//!
//! - `codec`: the [`ArrayMessage`] trait, slot helpers and [`WireCodec`]
//! - `request`: client-to-relay messages (`EVENT`, `REQ`, `CLOSE`)
//! - `response`: relay-to-client messages and [`InboundFrame`] routing
//! - `typed`: kind-specific event views
//! - `filter`: subscription filters

mod codec;
mod error;
mod filter;
mod request;
mod response;
mod typed;

pub use codec::{ArrayMessage, CodecConfig, SlotReader, SlotWriter, WireCodec};
pub use error::{Result, WireError};
pub use filter::Filter;
pub use request::{CloseRequest, EventRequest, SubscriptionRequest};
pub use response::{
    EoseResponse, EventResponse, InboundFrame, NoticeResponse, OkResponse, RawFrame,
    UnknownMessage,
};
pub use typed::TypedEvent;

pub const MESSAGE_EVENT: &str = "EVENT";
pub const MESSAGE_REQ: &str = "REQ";
pub const MESSAGE_CLOSE: &str = "CLOSE";
pub const MESSAGE_EOSE: &str = "EOSE";
pub const MESSAGE_NOTICE: &str = "NOTICE";
pub const MESSAGE_OK: &str = "OK";
pub const MESSAGE_AUTH: &str = "AUTH";
pub const MESSAGE_COUNT: &str = "COUNT";
