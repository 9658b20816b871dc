use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::codec::{FieldDecoder, PropertyDecoder};
use crate::entity::Entity;
use crate::error::{ParseError, RecordError};
use crate::key::Key;
use crate::raw::{RawField, RawRecord};
use crate::value::FieldValue;
use crate::wire::EntityProto;

struct Slot {
    raw: RawField,
    decoded: OnceCell<FieldValue>,
}

/// Entity wrapper that decodes a property on first access and memoizes it.
///
/// The key is decoded eagerly. Each property goes through the [`FieldDecoder`]
/// at most once per instance; later reads return the cached value.
///
/// `LazyRecord` is `Send` but not `Sync`: the memoization cache is unsynchronized,
/// so one instance belongs to one execution context at a time.
pub struct LazyRecord {
    key: Key,
    fields: HashMap<String, Slot>,
    decoder: Arc<dyn FieldDecoder>,
}

impl LazyRecord {
    pub fn new(raw: RawRecord) -> Self {
        Self::with_decoder(raw, Arc::new(PropertyDecoder))
    }

    pub fn with_decoder(raw: RawRecord, decoder: Arc<dyn FieldDecoder>) -> Self {
        let (key, fields) = raw.into_parts();
        let fields = fields
            .into_iter()
            .map(|(name, raw)| (name, Slot { raw, decoded: OnceCell::new() }))
            .collect();
        Self { key, fields, decoder }
    }

    pub fn from_proto(proto: EntityProto) -> Result<Self, ParseError> {
        Ok(Self::new(RawRecord::from_proto(proto)?))
    }

    /// Parse serialized entity bytes straight into a lazy record.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, ParseError> {
        Ok(Self::new(RawRecord::decode(bytes)?))
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn kind(&self) -> &str {
        self.key.kind()
    }

    /// Decoded value of `name`, decoding it now if this is the first access.
    ///
    /// A decode failure is not cached: the next access retries.
    pub fn get(&self, name: &str) -> Result<&FieldValue, RecordError> {
        let slot = self.fields.get(name).ok_or_else(|| RecordError::NotFound {
            kind: self.key.kind().to_string(),
            property: name.to_string(),
        })?;

        if let Some(value) = slot.decoded.get() {
            return Ok(value);
        }

        let value = match &slot.raw {
            RawField::Single(prop) => self.decoder.decode(prop)?,
            RawField::Multiple(props) => FieldValue::List(
                props
                    .iter()
                    .map(|p| self.decoder.decode(p))
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(slot.decoded.get_or_init(|| value))
    }

    /// Like [`get`](Self::get) but maps a missing property to `None`.
    pub fn get_opt(&self, name: &str) -> Result<Option<&FieldValue>, RecordError> {
        match self.get(name) {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn raw_field(&self, name: &str) -> Option<&RawField> {
        self.fields.get(name).map(|slot| &slot.raw)
    }

    pub fn is_decoded(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|slot| slot.decoded.get().is_some())
    }

    pub fn decoded_count(&self) -> usize {
        self.fields.values().filter(|slot| slot.decoded.get().is_some()).count()
    }

    /// Decode every property into an eager [`Entity`]. Properties come out sorted by name.
    pub fn to_entity(&self) -> Result<Entity, RecordError> {
        let mut names: Vec<&str> = self.field_names().collect();
        names.sort_unstable();

        let mut entity = Entity::new(self.key.clone());
        for name in names {
            entity.set(name, self.get(name)?.clone());
        }
        Ok(entity)
    }
}

impl fmt::Debug for LazyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRecord")
            .field("key", &self.key)
            .field("fields", &self.fields.len())
            .field("decoded", &self.decoded_count())
            .finish()
    }
}
