use std::collections::HashMap;
use std::collections::hash_map::Entry;

use prost::Message;

use crate::error::ParseError;
use crate::key::Key;
use crate::wire::{EntityProto, Property};

/// Undecoded descriptors for one property name.
#[derive(Debug, Clone, PartialEq)]
pub enum RawField {
    Single(Property),
    /// Wire order preserved.
    Multiple(Vec<Property>),
}

impl RawField {
    pub fn is_multiple(&self) -> bool {
        matches!(self, RawField::Multiple(_))
    }

    pub fn descriptors(&self) -> &[Property] {
        match self {
            RawField::Single(p) => std::slice::from_ref(p),
            RawField::Multiple(ps) => ps,
        }
    }
}

/// Parsed-but-undecoded entity: decoded key plus property descriptors by name.
///
/// Indexed properties are merged first, then unindexed ones.
#[derive(Debug, Clone)]
pub struct RawRecord {
    key: Key,
    fields: HashMap<String, RawField>,
}

impl RawRecord {
    pub fn from_proto(proto: EntityProto) -> Result<Self, ParseError> {
        let reference = proto.key.as_ref().ok_or(ParseError::MissingKey)?;
        let key = Key::from_reference(reference)?;

        let mut fields: HashMap<String, RawField> =
            HashMap::with_capacity(proto.property.len() + proto.raw_property.len());

        for prop in proto.property.into_iter().chain(proto.raw_property) {
            match fields.entry(prop.name.clone()) {
                Entry::Vacant(slot) => {
                    if prop.multiple {
                        slot.insert(RawField::Multiple(vec![prop]));
                    } else {
                        slot.insert(RawField::Single(prop));
                    }
                }
                Entry::Occupied(mut slot) => match (slot.get_mut(), prop.multiple) {
                    (RawField::Multiple(list), true) => list.push(prop),
                    // Repeated single-valued name: last one wins.
                    (RawField::Single(existing), false) => *existing = prop,
                    _ => return Err(ParseError::MixedMultiplicity(prop.name)),
                },
            }
        }

        Ok(Self { key, fields })
    }

    /// Parse serialized `EntityProto` bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, ParseError> {
        Self::from_proto(EntityProto::decode(bytes)?)
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn field(&self, name: &str) -> Option<&RawField> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_parts(self) -> (Key, HashMap<String, RawField>) {
        (self.key, self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_property;
    use crate::value::FieldValue;

    fn proto(indexed: Vec<Property>, raw: Vec<Property>) -> EntityProto {
        EntityProto {
            key: Some(Key::with_id("app", "Person", 1).to_reference()),
            property: indexed,
            raw_property: raw,
        }
    }

    fn p(name: &str, value: &str, multiple: bool) -> Property {
        encode_property(name, &FieldValue::from(value), multiple).unwrap()
    }

    #[test]
    fn indexed_then_raw_order_for_lists() {
        let record = RawRecord::from_proto(proto(
            vec![p("tags", "a", true), p("name", "n", false)],
            vec![p("tags", "b", true), p("tags", "c", true)],
        ))
        .unwrap();

        assert_eq!(record.len(), 2);
        let tags = record.field("tags").unwrap();
        assert!(tags.is_multiple());
        let names: Vec<_> = tags
            .descriptors()
            .iter()
            .map(|d| d.value.as_ref().unwrap().string_value.clone().unwrap())
            .collect();
        assert_eq!(names, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert!(!record.field("name").unwrap().is_multiple());
    }

    #[test]
    fn duplicate_single_keeps_last() {
        let record =
            RawRecord::from_proto(proto(vec![p("x", "1", false)], vec![p("x", "2", false)])).unwrap();
        let RawField::Single(prop) = record.field("x").unwrap() else {
            panic!("expected single");
        };
        assert_eq!(prop.value.as_ref().unwrap().string_value.as_deref(), Some(&b"2"[..]));
    }

    #[test]
    fn mixed_multiplicity_is_rejected() {
        let err = RawRecord::from_proto(proto(vec![p("x", "1", false), p("x", "2", true)], vec![]))
            .unwrap_err();
        assert!(matches!(err, ParseError::MixedMultiplicity(name) if name == "x"));
    }

    #[test]
    fn missing_key_is_rejected() {
        let mut pb = proto(vec![], vec![]);
        pb.key = None;
        assert!(matches!(RawRecord::from_proto(pb), Err(ParseError::MissingKey)));
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        assert!(matches!(RawRecord::decode(&[0xff, 0xff, 0xff]), Err(ParseError::Wire(_))));
    }
}
