//! Named values shared between modules
//!
//! A module that resolves an instance pointer stores it here under a name;
//! address descriptors of other modules refer to it through `VTPtrName`.
//! Entries are append-only and lookups return the first entry with a
//! matching name.

use serde::Serialize;
use strum::{Display, IntoStaticStr};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    U32(u32),
    U64(u64),
    Pointer(u64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum ValueKind {
    U32,
    U64,
    Pointer,
    Str,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::U32(_) => ValueKind::U32,
            Value::U64(_) => ValueKind::U64,
            Value::Pointer(_) => ValueKind::Pointer,
            Value::Str(_) => ValueKind::Str,
        }
    }
}

/// An address in the host process, stored as its own value kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Pointer(pub u64);

/// Conversion between a Rust type and its registry representation.
///
/// `from_value` returns `None` unless the stored kind is exactly this type's kind.
pub trait RegistryValue: Sized {
    const KIND: ValueKind;

    fn into_value(self) -> Value;
    fn from_value(value: &Value) -> Option<Self>;
}

impl RegistryValue for u32 {
    const KIND: ValueKind = ValueKind::U32;

    fn into_value(self) -> Value {
        Value::U32(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::U32(v) => Some(*v),
            _ => None,
        }
    }
}

impl RegistryValue for u64 {
    const KIND: ValueKind = ValueKind::U64;

    fn into_value(self) -> Value {
        Value::U64(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::U64(v) => Some(*v),
            _ => None,
        }
    }
}

impl RegistryValue for Pointer {
    const KIND: ValueKind = ValueKind::Pointer;

    fn into_value(self) -> Value {
        Value::Pointer(self.0)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Pointer(v) => Some(Pointer(*v)),
            _ => None,
        }
    }
}

impl RegistryValue for String {
    const KIND: ValueKind = ValueKind::Str;

    fn into_value(self) -> Value {
        Value::Str(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(v) => Some(v.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyValueEntry {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, Default)]
pub struct KeyValueRegistry {
    entries: Vec<KeyValueEntry>,
}

impl KeyValueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value. Existing entries with the same name are kept and
    /// continue to shadow this one.
    pub fn set<T: RegistryValue>(&mut self, name: impl Into<String>, value: T) {
        self.insert(name, value.into_value());
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        tracing::debug!("Registry: {} = {:?}", name, value);
        self.entries.push(KeyValueEntry { name, value });
    }

    /// Store an instance pointer for vtable lookups
    pub fn set_pointer(&mut self, name: impl Into<String>, address: u64) {
        self.set(name, Pointer(address));
    }

    /// Typed lookup of the first entry named `name`
    pub fn get<T: RegistryValue>(&self, name: &str) -> Option<T> {
        let value = self.get_value(name)?;
        let result = T::from_value(value);

        if result.is_none() {
            tracing::debug!(
                "Registry: {} holds {} but {} was requested",
                name,
                value.kind(),
                T::KIND
            );
        }

        result
    }

    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.value)
    }

    pub fn get_pointer(&self, name: &str) -> Option<u64> {
        self.get::<Pointer>(name).map(|p| p.0)
    }

    pub fn entries(&self) -> &[KeyValueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
