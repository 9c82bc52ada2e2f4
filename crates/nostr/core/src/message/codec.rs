use super::error::{Result, WireError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A message that travels as a JSON array with fixed positions.
///
/// Each implementor declares how many leading slots carry meaning and
/// reads/writes them by index. Elements past the declared slots are not
/// dropped: they land in the additional-data tail and are written back after
/// the declared slots.
pub trait ArrayMessage: Sized {
    /// Number of leading array positions with a declared meaning.
    const DECLARED_SLOTS: usize;

    fn write_slots(&self, slots: &mut SlotWriter) -> Result<()>;

    fn read_slots(slots: &SlotReader<'_>) -> Result<Self>;

    /// Trailing values past the declared slots.
    fn additional_data(&self) -> &[Value] {
        &[]
    }

    fn set_additional_data(&mut self, _data: Vec<Value>) {}

    fn to_array(&self) -> Result<Vec<Value>> {
        let mut slots = SlotWriter::new(Self::DECLARED_SLOTS);
        self.write_slots(&mut slots)?;
        Ok(slots.finish(self.additional_data()))
    }

    fn from_array(values: &[Value]) -> Result<Self> {
        let mut message = Self::read_slots(&SlotReader::new(values))?;
        if let Some(tail) = values.get(Self::DECLARED_SLOTS..)
            && !tail.is_empty()
        {
            message.set_additional_data(tail.to_vec());
        }
        Ok(message)
    }
}

/// Collects declared slot values before they are laid out as an array.
#[derive(Debug)]
pub struct SlotWriter {
    slots: Vec<Option<Value>>,
}

impl SlotWriter {
    pub fn new(declared: usize) -> Self {
        Self {
            slots: vec![None; declared],
        }
    }

    pub fn put<T: Serialize + ?Sized>(&mut self, index: usize, value: &T) -> Result<()> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(WireError::UndeclaredSlot(index))?;
        *slot = Some(serde_json::to_value(value)?);
        Ok(())
    }

    /// Like [`SlotWriter::put`], leaving the slot unfilled for `None`.
    pub fn put_opt<T: Serialize>(&mut self, index: usize, value: Option<&T>) -> Result<()> {
        match value {
            Some(value) => self.put(index, value),
            None => Ok(()),
        }
    }

    /// Lay the slots out in order, `null` for gaps, then append `additional`.
    ///
    /// Unfilled trailing slots are omitted, unless there is additional data
    /// that would otherwise slide into their positions.
    pub fn finish(self, additional: &[Value]) -> Vec<Value> {
        let used = if additional.is_empty() {
            self.slots
                .iter()
                .rposition(Option::is_some)
                .map_or(0, |last| last + 1)
        } else {
            self.slots.len()
        };

        self.slots
            .into_iter()
            .take(used)
            .map(|slot| slot.unwrap_or(Value::Null))
            .chain(additional.iter().cloned())
            .collect()
    }
}

/// Typed access to the elements of a decoded array.
#[derive(Debug, Clone, Copy)]
pub struct SlotReader<'a> {
    values: &'a [Value],
}

impl<'a> SlotReader<'a> {
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw element at `index`; `None` when missing or `null`.
    pub fn raw(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index).filter(|value| !value.is_null())
    }

    /// Element at `index` converted to `T`; `None` when missing or `null`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>> {
        self.raw(index)
            .map(|value| {
                T::deserialize(value).map_err(|source| WireError::Slot { index, source })
            })
            .transpose()
    }
}

/// Serializer settings. Held by a [`WireCodec`]; there is no global instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecConfig {
    /// Indent output. Relays expect compact frames, so this is for logs and fixtures.
    pub pretty: bool,
}

/// Encodes and decodes array messages according to a fixed [`CodecConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WireCodec {
    config: CodecConfig,
}

impl WireCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> CodecConfig {
        self.config
    }

    pub fn serialize<M: ArrayMessage>(&self, message: &M) -> Result<String> {
        let array = message.to_array()?;
        let text = if self.config.pretty {
            serde_json::to_string_pretty(&array)?
        } else {
            serde_json::to_string(&array)?
        };
        Ok(text)
    }

    pub fn deserialize<M: ArrayMessage>(&self, text: &str) -> Result<M> {
        let value: Value = serde_json::from_str(text)?;
        let array = value.as_array().ok_or(WireError::NotAnArray)?;
        M::from_array(array)
    }
}
