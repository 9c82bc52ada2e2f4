use super::codec::{ArrayMessage, SlotReader, SlotWriter, WireCodec};
use super::error::Result;
use super::typed::TypedEvent;
use super::{MESSAGE_EOSE, MESSAGE_EVENT, MESSAGE_NOTICE, MESSAGE_OK};
use crate::nip01::Event;
use serde_json::Value;

/// `["EVENT", subscription_id, event]` from a relay.
///
/// `event` is `None` when the relay sent no payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventResponse {
    pub subscription_id: Option<String>,
    pub event: Option<TypedEvent>,
    pub additional_data: Vec<Value>,
}

impl ArrayMessage for EventResponse {
    const DECLARED_SLOTS: usize = 3;

    fn write_slots(&self, slots: &mut SlotWriter) -> Result<()> {
        slots.put(0, MESSAGE_EVENT)?;
        slots.put_opt(1, self.subscription_id.as_ref())?;
        slots.put_opt(2, self.event.as_ref().map(TypedEvent::event))
    }

    fn read_slots(slots: &SlotReader<'_>) -> Result<Self> {
        let event: Option<Event> = slots.get(2)?;
        Ok(Self {
            subscription_id: slots.get(1)?,
            event: event.map(TypedEvent::from_event),
            additional_data: Vec::new(),
        })
    }

    fn additional_data(&self) -> &[Value] {
        &self.additional_data
    }

    fn set_additional_data(&mut self, data: Vec<Value>) {
        self.additional_data = data;
    }
}

/// `["EOSE", subscription_id]`: stored events for the subscription are done.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EoseResponse {
    pub subscription_id: Option<String>,
    pub additional_data: Vec<Value>,
}

impl ArrayMessage for EoseResponse {
    const DECLARED_SLOTS: usize = 2;

    fn write_slots(&self, slots: &mut SlotWriter) -> Result<()> {
        slots.put(0, MESSAGE_EOSE)?;
        slots.put_opt(1, self.subscription_id.as_ref())
    }

    fn read_slots(slots: &SlotReader<'_>) -> Result<Self> {
        Ok(Self {
            subscription_id: slots.get(1)?,
            additional_data: Vec::new(),
        })
    }

    fn additional_data(&self) -> &[Value] {
        &self.additional_data
    }

    fn set_additional_data(&mut self, data: Vec<Value>) {
        self.additional_data = data;
    }
}

/// `["NOTICE", message]`: human-readable text from the relay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoticeResponse {
    pub message: Option<String>,
    pub additional_data: Vec<Value>,
}

impl ArrayMessage for NoticeResponse {
    const DECLARED_SLOTS: usize = 2;

    fn write_slots(&self, slots: &mut SlotWriter) -> Result<()> {
        slots.put(0, MESSAGE_NOTICE)?;
        slots.put_opt(1, self.message.as_ref())
    }

    fn read_slots(slots: &SlotReader<'_>) -> Result<Self> {
        Ok(Self {
            message: slots.get(1)?,
            additional_data: Vec::new(),
        })
    }

    fn additional_data(&self) -> &[Value] {
        &self.additional_data
    }

    fn set_additional_data(&mut self, data: Vec<Value>) {
        self.additional_data = data;
    }
}

/// `["OK", event_id, accepted, message]`: result of publishing an event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OkResponse {
    pub event_id: Option<String>,
    pub accepted: bool,
    pub message: Option<String>,
    pub additional_data: Vec<Value>,
}

impl ArrayMessage for OkResponse {
    const DECLARED_SLOTS: usize = 4;

    fn write_slots(&self, slots: &mut SlotWriter) -> Result<()> {
        slots.put(0, MESSAGE_OK)?;
        slots.put_opt(1, self.event_id.as_ref())?;
        slots.put(2, &self.accepted)?;
        slots.put_opt(3, self.message.as_ref())
    }

    fn read_slots(slots: &SlotReader<'_>) -> Result<Self> {
        Ok(Self {
            event_id: slots.get(1)?,
            accepted: slots.get(2)?.unwrap_or(false),
            message: slots.get(3)?,
            additional_data: Vec::new(),
        })
    }

    fn additional_data(&self) -> &[Value] {
        &self.additional_data
    }

    fn set_additional_data(&mut self, data: Vec<Value>) {
        self.additional_data = data;
    }
}

/// Array frame whose type this client does not model (`AUTH`, `COUNT`,
/// `CLOSED`, ...). Everything after the type is kept as-is.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnknownMessage {
    pub message_type: Option<String>,
    pub additional_data: Vec<Value>,
}

impl ArrayMessage for UnknownMessage {
    const DECLARED_SLOTS: usize = 1;

    fn write_slots(&self, slots: &mut SlotWriter) -> Result<()> {
        slots.put_opt(0, self.message_type.as_ref())
    }

    fn read_slots(slots: &SlotReader<'_>) -> Result<Self> {
        Ok(Self {
            message_type: slots.get(0)?,
            additional_data: Vec::new(),
        })
    }

    fn additional_data(&self) -> &[Value] {
        &self.additional_data
    }

    fn set_additional_data(&mut self, data: Vec<Value>) {
        self.additional_data = data;
    }
}

/// Text that could not be read as a relay message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawFrame {
    pub text: String,
    /// Why decoding gave up, when there is more to say than "not an array".
    pub error: Option<String>,
}

impl RawFrame {
    fn new(text: &str, error: Option<String>) -> Self {
        Self {
            text: text.to_string(),
            error,
        }
    }
}

/// One inbound frame, routed by its message type.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Event(EventResponse),
    Eose(EoseResponse),
    Notice(NoticeResponse),
    Ok(OkResponse),
    Unknown(UnknownMessage),
    Raw(RawFrame),
}

impl WireCodec {
    /// Route a text frame received from a relay.
    ///
    /// Never fails: input that is not a JSON array led by a string type, or
    /// whose declared slots have the wrong shape, becomes [`InboundFrame::Raw`].
    /// Type names are matched case-insensitively.
    pub fn decode_frame(&self, text: &str) -> InboundFrame {
        let trimmed = text.trim();
        if !trimmed.starts_with('[') {
            return InboundFrame::Raw(RawFrame::new(text, None));
        }

        let values: Vec<Value> = match serde_json::from_str(trimmed) {
            Ok(values) => values,
            Err(err) => return InboundFrame::Raw(RawFrame::new(text, Some(err.to_string()))),
        };
        let Some(message_type) = values.first().and_then(Value::as_str) else {
            return InboundFrame::Raw(RawFrame::new(
                text,
                Some("missing message type".to_string()),
            ));
        };

        let decoded = match message_type.to_ascii_uppercase().as_str() {
            MESSAGE_EVENT => EventResponse::from_array(&values).map(InboundFrame::Event),
            MESSAGE_EOSE => EoseResponse::from_array(&values).map(InboundFrame::Eose),
            MESSAGE_NOTICE => NoticeResponse::from_array(&values).map(InboundFrame::Notice),
            MESSAGE_OK => OkResponse::from_array(&values).map(InboundFrame::Ok),
            _ => UnknownMessage::from_array(&values).map(InboundFrame::Unknown),
        };

        decoded.unwrap_or_else(|err| InboundFrame::Raw(RawFrame::new(text, Some(err.to_string()))))
    }
}
