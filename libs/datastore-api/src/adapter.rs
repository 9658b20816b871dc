use crate::entity::Entity;
use crate::error::StoreError;
use crate::key::Key;
use crate::lazy::LazyRecord;
use crate::wire::{EntityProto, Reference};

/// Application-level form of a fetched entity.
#[derive(Debug)]
pub enum Record {
    Entity(Entity),
    Lazy(LazyRecord),
}

impl Record {
    pub fn key(&self) -> &Key {
        match self {
            Record::Entity(e) => e.key(),
            Record::Lazy(l) => l.key(),
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Record::Entity(_) => "entity",
            Record::Lazy(_) => "lazy",
        }
    }

    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Record::Entity(e) => Some(e),
            Record::Lazy(_) => None,
        }
    }

    pub fn into_lazy(self) -> Option<LazyRecord> {
        match self {
            Record::Lazy(l) => Some(l),
            Record::Entity(_) => None,
        }
    }
}

/// Conversion strategy between wire messages and application values.
///
/// A [`Connection`](crate::connection::Connection) runs every key it sends
/// and every entity it receives through its current adapter.
pub trait Adapter: Send + Sync {
    fn decode_key(&self, pb: &Reference) -> Result<Key, StoreError>;

    fn decode_record(&self, pb: EntityProto) -> Result<Record, StoreError>;

    fn encode_key(&self, key: &Key) -> Reference;

    fn encode_record(&self, entity: &Entity) -> Result<EntityProto, StoreError>;
}

/// Default adapter: fully decodes every entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelAdapter;

impl Adapter for ModelAdapter {
    fn decode_key(&self, pb: &Reference) -> Result<Key, StoreError> {
        Ok(Key::from_reference(pb)?)
    }

    fn decode_record(&self, pb: EntityProto) -> Result<Record, StoreError> {
        Entity::from_proto(pb).map(Record::Entity)
    }

    fn encode_key(&self, key: &Key) -> Reference {
        key.to_reference()
    }

    fn encode_record(&self, entity: &Entity) -> Result<EntityProto, StoreError> {
        Ok(entity.to_proto()?)
    }
}
