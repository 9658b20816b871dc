use std::collections::BTreeSet;

use prost::Message;

use crate::codec::{FieldDecoder, PropertyDecoder, encode_field};
use crate::error::{EncodeError, ParseError, StoreError};
use crate::key::Key;
use crate::raw::{RawField, RawRecord};
use crate::value::FieldValue;
use crate::wire::EntityProto;

/// Fully decoded entity, as produced by the eager path.
///
/// Properties keep insertion order. Names in `unindexed` are written to the
/// raw property list on encode.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    key: Key,
    entries: Vec<(String, FieldValue)>,
    unindexed: BTreeSet<String>,
}

impl Entity {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            entries: Vec::new(),
            unindexed: BTreeSet::new(),
        }
    }

    /// Decode every property of `proto` with the standard decoder.
    pub fn from_proto(proto: EntityProto) -> Result<Self, StoreError> {
        Self::from_proto_with(proto, &PropertyDecoder)
    }

    pub fn from_proto_with(
        proto: EntityProto,
        decoder: &dyn FieldDecoder,
    ) -> Result<Self, StoreError> {
        let unindexed: BTreeSet<String> =
            proto.raw_property.iter().map(|p| p.name.clone()).collect();
        let wire_order: Vec<String> = proto
            .property
            .iter()
            .chain(&proto.raw_property)
            .map(|p| p.name.clone())
            .collect();

        let (key, mut fields) = RawRecord::from_proto(proto)?.into_parts();
        let mut entity = Self::new(key);
        entity.unindexed = unindexed;

        for name in wire_order {
            let Some(raw) = fields.remove(&name) else {
                continue;
            };
            let value = match raw {
                RawField::Single(prop) => decoder.decode(&prop)?,
                RawField::Multiple(props) => FieldValue::List(
                    props
                        .iter()
                        .map(|p| decoder.decode(p))
                        .collect::<Result<_, _>>()?,
                ),
            };
            entity.entries.push((name, value));
        }
        Ok(entity)
    }

    /// Parse and fully decode serialized entity bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, StoreError> {
        let proto = EntityProto::decode(bytes).map_err(ParseError::from)?;
        Self::from_proto(proto)
    }

    pub fn to_proto(&self) -> Result<EntityProto, EncodeError> {
        let mut proto = EntityProto {
            key: Some(self.key.to_reference()),
            ..Default::default()
        };
        for (name, value) in &self.entries {
            let props = encode_field(name, value)?;
            if self.unindexed.contains(name) {
                proto.raw_property.extend(props);
            } else {
                proto.property.extend(props);
            }
        }
        Ok(proto)
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == &name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Set a property that is stored without an index.
    pub fn set_unindexed(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        self.unindexed.insert(name.clone());
        self.set(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn is_indexed(&self, name: &str) -> bool {
        !self.unindexed.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn properties(&self) -> &[(String, FieldValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy with properties sorted by name.
    pub fn sorted(&self) -> Self {
        let mut copy = self.clone();
        copy.entries.sort_by(|a, b| a.0.cmp(&b.0));
        copy
    }
}
