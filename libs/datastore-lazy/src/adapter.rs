use std::sync::Arc;

use datastore_api::wire::{EntityProto, Reference};
use datastore_api::{Adapter, Entity, FieldDecoder, Key, LazyRecord, RawRecord, Record, StoreError};

/// Wraps the connection's adapter and turns entity decoding into lazy records.
///
/// Key decoding and both encode directions go to the wrapped adapter unchanged.
pub struct LazyAdapter {
    inner: Arc<dyn Adapter>,
    decoder: Arc<dyn FieldDecoder>,
}

impl LazyAdapter {
    pub fn new(inner: Arc<dyn Adapter>, decoder: Arc<dyn FieldDecoder>) -> Self {
        Self { inner, decoder }
    }

    pub fn inner(&self) -> &Arc<dyn Adapter> {
        &self.inner
    }
}

impl Adapter for LazyAdapter {
    fn decode_key(&self, pb: &Reference) -> Result<Key, StoreError> {
        self.inner.decode_key(pb)
    }

    fn decode_record(&self, pb: EntityProto) -> Result<Record, StoreError> {
        let raw = RawRecord::from_proto(pb)?;
        Ok(Record::Lazy(LazyRecord::with_decoder(raw, Arc::clone(&self.decoder))))
    }

    fn encode_key(&self, key: &Key) -> Reference {
        self.inner.encode_key(key)
    }

    fn encode_record(&self, entity: &Entity) -> Result<EntityProto, StoreError> {
        self.inner.encode_record(entity)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use datastore_api::{FieldValue, ModelAdapter, PropertyDecoder};

    use super::*;

    #[derive(Default)]
    struct CountingAdapter {
        encode_keys: AtomicUsize,
        decode_keys: AtomicUsize,
        encode_records: AtomicUsize,
    }

    impl Adapter for CountingAdapter {
        fn decode_key(&self, pb: &Reference) -> Result<Key, StoreError> {
            self.decode_keys.fetch_add(1, Ordering::SeqCst);
            ModelAdapter.decode_key(pb)
        }

        fn decode_record(&self, pb: EntityProto) -> Result<Record, StoreError> {
            ModelAdapter.decode_record(pb)
        }

        fn encode_key(&self, key: &Key) -> Reference {
            self.encode_keys.fetch_add(1, Ordering::SeqCst);
            ModelAdapter.encode_key(key)
        }

        fn encode_record(&self, entity: &Entity) -> Result<EntityProto, StoreError> {
            self.encode_records.fetch_add(1, Ordering::SeqCst);
            ModelAdapter.encode_record(entity)
        }
    }

    #[test]
    fn forwards_everything_but_record_decoding() {
        let inner = Arc::new(CountingAdapter::default());
        let lazy = LazyAdapter::new(inner.clone(), Arc::new(PropertyDecoder));
        let wrapped: Arc<dyn Adapter> = inner.clone();
        assert!(Arc::ptr_eq(lazy.inner(), &wrapped));

        let key = Key::with_id("app", "Person", 1);
        let reference = lazy.encode_key(&key);
        assert_eq!(lazy.decode_key(&reference).unwrap(), key);

        let mut entity = Entity::new(key.clone());
        entity.set("name", FieldValue::from("alice"));
        let pb = lazy.encode_record(&entity).unwrap();

        let record = lazy.decode_record(pb).unwrap();
        let lazy_record = record.into_lazy().expect("lazy record");
        assert_eq!(lazy_record.key(), &key);
        assert_eq!(lazy_record.decoded_count(), 0);
        assert_eq!(lazy_record.get("name").unwrap().as_str(), Some("alice"));

        assert_eq!(inner.encode_keys.load(Ordering::SeqCst), 1);
        assert_eq!(inner.decode_keys.load(Ordering::SeqCst), 1);
        assert_eq!(inner.encode_records.load(Ordering::SeqCst), 1);
    }
}
