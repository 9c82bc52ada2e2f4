use crate::message::{ArrayMessage, SlotReader, SlotWriter, WireError};
use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of an event's `tags` array: `[identifier, ...values]`.
///
/// Only the identifier has a fixed slot; everything after it is kept as raw
/// JSON so non-string extensions survive a parse/serialize cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tag {
    identifier: Option<String>,
    additional_data: Vec<Value>,
}

impl Tag {
    pub const EVENT: &'static str = "e";
    pub const PROFILE: &'static str = "p";
    pub const ADDRESS: &'static str = "a";

    pub fn new<I, V>(identifier: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            identifier: Some(identifier.into()),
            additional_data: values
                .into_iter()
                .map(|value| Value::String(value.into()))
                .collect(),
        }
    }

    /// Build a tag from raw parts, e.g. when values are not plain strings.
    pub fn from_parts(identifier: Option<String>, additional_data: Vec<Value>) -> Self {
        Self {
            identifier,
            additional_data,
        }
    }

    /// `["e", event_id]`
    pub fn event(event_id: impl Into<String>) -> Self {
        Self::new(Self::EVENT, [event_id.into()])
    }

    /// `["p", pubkey]`
    pub fn profile(pubkey: impl Into<String>) -> Self {
        Self::new(Self::PROFILE, [pubkey.into()])
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Everything after the identifier, verbatim.
    pub fn values(&self) -> &[Value] {
        &self.additional_data
    }

    /// String value at `index` after the identifier.
    pub fn value(&self, index: usize) -> Option<&str> {
        self.additional_data.get(index).and_then(Value::as_str)
    }

    pub fn first_value(&self) -> Option<&str> {
        self.value(0)
    }

    fn has_value(&self, expected: &str) -> bool {
        self.additional_data
            .iter()
            .any(|value| value.as_str() == Some(expected))
    }
}

impl ArrayMessage for Tag {
    const DECLARED_SLOTS: usize = 1;

    fn write_slots(&self, slots: &mut SlotWriter) -> Result<(), WireError> {
        slots.put_opt(0, self.identifier.as_ref())
    }

    fn read_slots(slots: &SlotReader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            identifier: slots.get(0)?,
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

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array()
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<Value>::deserialize(deserializer)?;
        Self::from_array(&values).map_err(de::Error::custom)
    }
}

/// Ordered tag list of an event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(Vec<Tag>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: Tag) {
        self.0.push(tag);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.0.iter()
    }

    /// All tags with the given identifier, in order.
    pub fn find_all<'s, 'i>(&'s self, identifier: &'i str) -> impl Iterator<Item = &'s Tag> {
        self.0
            .iter()
            .filter(move |tag| tag.identifier() == Some(identifier))
    }

    pub fn find_first(&self, identifier: &str) -> Option<&Tag> {
        self.find_all(identifier).next()
    }

    pub fn find_first_value(&self, identifier: &str) -> Option<&str> {
        self.find_first(identifier).and_then(Tag::first_value)
    }

    pub fn events(&self) -> impl Iterator<Item = &Tag> {
        self.find_all(Tag::EVENT)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &Tag> {
        self.find_all(Tag::PROFILE)
    }

    pub fn contains_tag(&self, identifier: &str, value: &str) -> bool {
        self.find_all(identifier).any(|tag| tag.has_value(value))
    }

    pub fn contains_event(&self, event_id: &str) -> bool {
        self.contains_tag(Tag::EVENT, event_id)
    }

    pub fn contains_profile(&self, pubkey: &str) -> bool {
        self.contains_tag(Tag::PROFILE, pubkey)
    }
}

impl From<Vec<Tag>> for Tags {
    fn from(tags: Vec<Tag>) -> Self {
        Self(tags)
    }
}

impl FromIterator<Tag> for Tags {
    fn from_iter<T: IntoIterator<Item = Tag>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Tags {
    type Item = Tag;
    type IntoIter = std::vec::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
