use crate::nip01::{
    Event, KIND_CONTACTS, KIND_ENCRYPTED_DIRECT_MESSAGE, KIND_METADATA, KIND_ZAP, MetadataEvent,
};
use crate::nip02::ContactsEvent;
use crate::nip04::EncryptedEvent;
use crate::nip57::ZapReceiptEvent;

/// An event decoded into the view that matches its kind.
///
/// Kinds without a dedicated view stay [`TypedEvent::Generic`].
#[derive(Debug, Clone, PartialEq)]
pub enum TypedEvent {
    Metadata(MetadataEvent),
    Contacts(ContactsEvent),
    EncryptedDirectMessage(EncryptedEvent),
    ZapReceipt(ZapReceiptEvent),
    Generic(Event),
}

impl TypedEvent {
    pub fn from_event(event: Event) -> Self {
        match event.kind {
            KIND_METADATA => Self::Metadata(MetadataEvent::from_event(event)),
            KIND_CONTACTS => Self::Contacts(ContactsEvent::from_event(event)),
            KIND_ENCRYPTED_DIRECT_MESSAGE => {
                Self::EncryptedDirectMessage(EncryptedEvent::from_event(event))
            }
            KIND_ZAP => Self::ZapReceipt(ZapReceiptEvent::from_event(event)),
            _ => Self::Generic(event),
        }
    }

    pub fn event(&self) -> &Event {
        match self {
            Self::Metadata(view) => &view.event,
            Self::Contacts(view) => &view.event,
            Self::EncryptedDirectMessage(view) => &view.event,
            Self::ZapReceipt(view) => &view.event,
            Self::Generic(event) => event,
        }
    }

    pub fn into_event(self) -> Event {
        match self {
            Self::Metadata(view) => view.event,
            Self::Contacts(view) => view.event,
            Self::EncryptedDirectMessage(view) => view.event,
            Self::ZapReceipt(view) => view.event,
            Self::Generic(event) => event,
        }
    }

    pub fn kind(&self) -> u16 {
        self.event().kind
    }
}

impl From<Event> for TypedEvent {
    fn from(event: Event) -> Self {
        Self::from_event(event)
    }
}
