use super::codec::{ArrayMessage, SlotReader, SlotWriter};
use super::error::Result;
use super::filter::Filter;
use super::{MESSAGE_CLOSE, MESSAGE_EVENT, MESSAGE_REQ};
use crate::nip01::Event;
use serde_json::Value;

/// `["EVENT", event]`: publish an event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventRequest {
    pub event: Event,
    pub additional_data: Vec<Value>,
}

impl EventRequest {
    pub fn new(event: Event) -> Self {
        Self {
            event,
            additional_data: Vec::new(),
        }
    }
}

impl ArrayMessage for EventRequest {
    const DECLARED_SLOTS: usize = 2;

    fn write_slots(&self, slots: &mut SlotWriter) -> Result<()> {
        slots.put(0, MESSAGE_EVENT)?;
        slots.put(1, &self.event)
    }

    fn read_slots(slots: &SlotReader<'_>) -> Result<Self> {
        Ok(Self {
            event: slots.get(1)?.unwrap_or_default(),
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

/// `["REQ", subscription_id, filter]`: open a subscription.
///
/// Relays accept several filters per request; any after the first ride in
/// `additional_data`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubscriptionRequest {
    pub subscription_id: String,
    pub filter: Filter,
    pub additional_data: Vec<Value>,
}

impl SubscriptionRequest {
    pub fn new(subscription_id: impl Into<String>, filter: Filter) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            filter,
            additional_data: Vec::new(),
        }
    }
}

impl ArrayMessage for SubscriptionRequest {
    const DECLARED_SLOTS: usize = 3;

    fn write_slots(&self, slots: &mut SlotWriter) -> Result<()> {
        slots.put(0, MESSAGE_REQ)?;
        slots.put(1, &self.subscription_id)?;
        slots.put(2, &self.filter)
    }

    fn read_slots(slots: &SlotReader<'_>) -> Result<Self> {
        Ok(Self {
            subscription_id: slots.get(1)?.unwrap_or_default(),
            filter: slots.get(2)?.unwrap_or_default(),
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

/// `["CLOSE", subscription_id]`: stop a subscription.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloseRequest {
    pub subscription_id: String,
    pub additional_data: Vec<Value>,
}

impl CloseRequest {
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            additional_data: Vec::new(),
        }
    }
}

impl ArrayMessage for CloseRequest {
    const DECLARED_SLOTS: usize = 2;

    fn write_slots(&self, slots: &mut SlotWriter) -> Result<()> {
        slots.put(0, MESSAGE_CLOSE)?;
        slots.put(1, &self.subscription_id)
    }

    fn read_slots(slots: &SlotReader<'_>) -> Result<Self> {
        Ok(Self {
            subscription_id: slots.get(1)?.unwrap_or_default(),
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
