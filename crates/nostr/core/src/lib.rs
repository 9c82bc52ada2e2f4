pub mod bech32;
pub mod keys;
pub mod message;
pub mod nip01;
pub mod nip02;
pub mod nip04;
pub mod nip19;
pub mod nip57;

pub use keys::{KeyError, Keypair, PrivateKey, PublicKey};
pub use message::{
    ArrayMessage, CloseRequest, CodecConfig, EoseResponse, EventRequest, EventResponse, Filter,
    InboundFrame, NoticeResponse, OkResponse, RawFrame, SubscriptionRequest, TypedEvent,
    UnknownMessage, WireCodec, WireError,
};
pub use nip01::{
    Event, EventTemplate, KindClassification, Metadata, MetadataEvent, Nip01Error, Tag, Tags,
    classify_kind,
};
pub use nip02::{ContactsEvent, RelayPolicy};
pub use nip04::{EncryptedEvent, Nip04Error};
pub use nip19::{
    AddressIdentifier, EventIdentifier, Identifier, Nip19Error, ProfileIdentifier,
    RelayIdentifier,
};
pub use nip57::ZapReceiptEvent;
