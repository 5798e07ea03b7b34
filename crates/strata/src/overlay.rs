//! Decoding a document over a record's current state.
//!
//! [`Overlay`] is a deserializer that pairs the incoming document with the
//! record's serialized state and lets the record's own `Deserialize` impl
//! decide how the two combine:
//!
//! - structs take each field from the document when present, otherwise from
//!   the current state;
//! - maps keep their current entries and take new or replaced entries from
//!   the document;
//! - everything else (scalars, sequences, enums, untyped values) is replaced
//!   by the document outright.
//!
//! Only the document's keys can reach the record's unknown-field handling, so
//! wrapping an [`Overlay`] in `serde_ignored` reports exactly the document keys
//! the record does not accept.

use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, Visitor};
use serde_json::{Map, Value};

macro_rules! replace_with_document {
    ($($method:ident),* $(,)?) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value, Self::Error>
            where
                V: Visitor<'de>,
            {
                self.doc.$method(visitor)
            }
        )*
    };
}

/// A document value laid over the value it replaces.
pub(crate) struct Overlay {
    doc: Value,
    base: Value,
}

impl Overlay {
    pub(crate) fn new(doc: Value, base: Value) -> Self {
        Self { doc, base }
    }
}

impl<'de> Deserializer<'de> for Overlay {
    type Error = serde_json::Error;

    replace_with_document! {
        deserialize_any,
        deserialize_bool,
        deserialize_i8,
        deserialize_i16,
        deserialize_i32,
        deserialize_i64,
        deserialize_i128,
        deserialize_u8,
        deserialize_u16,
        deserialize_u32,
        deserialize_u64,
        deserialize_u128,
        deserialize_f32,
        deserialize_f64,
        deserialize_char,
        deserialize_str,
        deserialize_string,
        deserialize_bytes,
        deserialize_byte_buf,
        deserialize_unit,
        deserialize_seq,
        deserialize_identifier,
        deserialize_ignored_any,
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match (self.doc, self.base) {
            (Value::Null, _) => visitor.visit_none(),
            (doc, Value::Null) => visitor.visit_some(doc),
            (doc, base) => visitor.visit_some(Self::new(doc, base)),
        }
    }

    fn deserialize_unit_struct<V>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.doc.deserialize_unit_struct(name, visitor)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.doc.deserialize_tuple(len, visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.doc.deserialize_tuple_struct(name, len, visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match (self.doc, self.base) {
            (Value::Object(doc), Value::Object(mut base)) => {
                base.extend(doc);
                Value::Object(base).deserialize_map(visitor)
            }
            (doc, _) => doc.deserialize_map(visitor),
        }
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match (self.doc, self.base) {
            (Value::Object(doc), Value::Object(base)) => {
                visitor.visit_map(FieldOverlay::new(doc, base, fields))
            }
            (doc, _) => doc.deserialize_struct(name, fields, visitor),
        }
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.doc.deserialize_enum(name, variants, visitor)
    }
}

enum Entry {
    Document(Value),
    Current(Value),
    Both { doc: Value, base: Value },
}

/// Struct fields in document order, followed by the current values of the
/// fields the document leaves out.
struct FieldOverlay {
    entries: std::vec::IntoIter<(String, Entry)>,
    pending: Option<Entry>,
}

impl FieldOverlay {
    fn new(doc: Map<String, Value>, mut base: Map<String, Value>, fields: &[&str]) -> Self {
        let mut entries = Vec::with_capacity(doc.len() + base.len());

        for (key, doc) in doc {
            let entry = match base.remove(&key) {
                Some(base) => Entry::Both { doc, base },
                None => Entry::Document(doc),
            };
            entries.push((key, entry));
        }

        // Serialized-only keys (skip_deserializing, serialize-side renames)
        // are not fields the record reads back.
        entries.extend(
            base.into_iter()
                .filter(|(key, _)| fields.contains(&key.as_str()))
                .map(|(key, value)| (key, Entry::Current(value))),
        );

        Self {
            entries: entries.into_iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for FieldOverlay {
    type Error = serde_json::Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: DeserializeSeed<'de>,
    {
        match self.entries.next() {
            Some((key, entry)) => {
                self.pending = Some(entry);
                seed.deserialize(Value::String(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        match self.pending.take() {
            Some(Entry::Document(value) | Entry::Current(value)) => seed.deserialize(value),
            Some(Entry::Both { doc, base }) => seed.deserialize(Overlay::new(doc, base)),
            None => Err(de::Error::custom("value requested before its key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}
