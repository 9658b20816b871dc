use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use datastore_api::wire::Property;
use datastore_api::{
    ApiVersion, Connection, DecodeError, Entity, ErrorKind, FieldDecoder, FieldValue, Key, KeyId,
    Record, RecordError, codec::decode_property,
};
use datastore_lazy::FetchError;
use datastore_storage_memory::{MemoryStorage, MemoryStorageConfig};

fn alice_key() -> Key {
    Key::with_id("app", "Person", 1)
}

fn alice() -> Entity {
    let mut e = Entity::new(alice_key());
    e.set("name", "alice".into());
    e.set_unindexed("tags", vec!["x", "y"].into());
    e
}

fn everything() -> Entity {
    let mut e = Entity::new(Key::with_name("app", "Sample", "all"));
    e.set("int", FieldValue::Int64(-7));
    e.set("bool", FieldValue::Bool(false));
    e.set("double", FieldValue::Double(0.25));
    e.set("when", FieldValue::Timestamp(1_600_000_000_123_456));
    e.set("rating", FieldValue::Rating(99));
    e.set("string", "plain".into());
    e.set_unindexed("text", FieldValue::Text("long body".into()));
    e.set("category", FieldValue::Category("c".into()));
    e.set("link", FieldValue::Link("https://example.com".into()));
    e.set("email", FieldValue::Email("a@example.com".into()));
    e.set("im", FieldValue::Im("xmpp a@example.com".into()));
    e.set("phone", FieldValue::PhoneNumber("+1 555".into()));
    e.set("address", FieldValue::PostalAddress("1 Main St".into()));
    e.set("blob_key", FieldValue::BlobKey("bk-1".into()));
    e.set_unindexed("blob", FieldValue::Blob(vec![0, 255, 7]));
    e.set("short_blob", FieldValue::ByteString(vec![9, 9]));
    e.set_unindexed("embedded", FieldValue::EmbeddedEntity(vec![1, 2, 3]));
    e.set("where", FieldValue::GeoPt { lat: -33.9, lon: 151.2 });
    e.set(
        "owner",
        FieldValue::User { email: "o@example.com".into(), auth_domain: "example.com".into() },
    );
    e.set("ref", FieldValue::Key(alice_key().child("Pet", KeyId::Name("rex".into()))));
    e.set("null", FieldValue::Null);
    e.set("numbers", vec![3i64, 1, 2].into());
    e
}

async fn storage_with(config: MemoryStorageConfig, entities: &[Entity]) -> Arc<MemoryStorage> {
    let storage = Arc::new(MemoryStorage::new(&config));
    for e in entities {
        storage.insert_entity(e).await.unwrap();
    }
    storage
}

#[tokio::test]
async fn fetch_end_to_end() {
    let storage = storage_with(MemoryStorageConfig::default(), &[alice()]).await;
    let mut conn = Connection::new(storage.clone());
    let missing = Key::with_id("app", "Person", 2);

    let results = datastore_lazy::get(&mut conn, &[alice_key(), missing]).await.unwrap();

    assert_eq!(results.len(), 2);
    let first = results[0].as_ref().expect("k1 present");
    assert_eq!(first.key(), &alice_key());
    assert_eq!(first.get("name").unwrap(), &FieldValue::from("alice"));
    assert_eq!(first.get("tags").unwrap(), &FieldValue::from(vec!["x", "y"]));
    assert!(results[1].is_none());
    assert_eq!(storage.calls(), 1);
}

#[tokio::test]
async fn lazy_values_equal_eager_values() {
    let sample = everything();
    let storage = storage_with(MemoryStorageConfig::default(), &[sample.clone()]).await;
    let mut conn = Connection::new(storage);
    let keys = [sample.key().clone()];

    let eager = conn.get(&keys).await.unwrap().remove(0).and_then(Record::into_entity).unwrap();
    let lazy = datastore_lazy::get(&mut conn, &keys).await.unwrap().remove(0).unwrap();

    assert_eq!(eager.sorted(), sample.sorted());
    for (name, value) in eager.iter() {
        assert_eq!(lazy.get(name).unwrap(), value, "{name}");
    }
    assert_eq!(lazy.decoded_count(), eager.len());
}

#[derive(Default)]
struct CountingDecoder {
    calls: AtomicUsize,
}

impl FieldDecoder for CountingDecoder {
    fn decode(&self, property: &Property) -> Result<FieldValue, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        decode_property(property)
    }
}

#[tokio::test]
async fn decoder_runs_once_per_distinct_field() {
    let storage = storage_with(MemoryStorageConfig::default(), &[everything()]).await;
    let mut conn = Connection::new(storage);
    let decoder = Arc::new(CountingDecoder::default());

    let record = datastore_lazy::get_with_decoder(
        &mut conn,
        &[Key::with_name("app", "Sample", "all")],
        decoder.clone(),
    )
    .await
    .unwrap()
    .remove(0)
    .unwrap();
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 0);

    for _ in 0..10 {
        record.get("int").unwrap();
        record.get("string").unwrap();
        record.get("when").unwrap();
    }
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 3);

    // 3 descriptors, decoded on first access only
    record.get("numbers").unwrap();
    record.get("numbers").unwrap();
    assert_eq!(decoder.calls.load(Ordering::SeqCst), 6);
    assert_eq!(record.get("numbers").unwrap(), &FieldValue::from(vec![3i64, 1, 2]));
}

#[tokio::test]
async fn missing_field_is_not_found_not_missing_record() {
    let storage = storage_with(MemoryStorageConfig::default(), &[alice()]).await;
    let mut conn = Connection::new(storage);

    let record = datastore_lazy::get(&mut conn, &[alice_key()]).await.unwrap().remove(0).unwrap();
    let err = record.get("age").unwrap_err();
    assert_eq!(err, RecordError::NotFound { kind: "Person".into(), property: "age".into() });
}

#[tokio::test]
async fn unsupported_api_version_fails_before_any_lookup() {
    let storage = storage_with(MemoryStorageConfig::default(), &[alice()]).await;
    let mut conn = Connection::new(storage.clone()).with_api_version(ApiVersion::V4);
    let original = Arc::clone(conn.adapter());

    let err = datastore_lazy::get(&mut conn, &[alice_key()]).await.unwrap_err();

    assert!(matches!(err, FetchError::UnsupportedApiVersion(ApiVersion::V4)));
    assert!(!err.is_retryable());
    assert_eq!(storage.calls(), 0);
    assert!(Arc::ptr_eq(conn.adapter(), &original));
}

#[tokio::test]
async fn adapter_restored_after_success_and_failure() {
    let config = MemoryStorageConfig { max_batch: 1, ..Default::default() };
    let storage = storage_with(config, &[alice()]).await;
    let mut conn = Connection::new(storage.clone());
    let original = Arc::clone(conn.adapter());

    datastore_lazy::get(&mut conn, &[alice_key()]).await.unwrap();
    assert!(Arc::ptr_eq(conn.adapter(), &original));

    let err = datastore_lazy::get(&mut conn, &[alice_key(), alice_key()]).await.unwrap_err();
    assert!(matches!(&err, FetchError::Store(e) if e.kind == ErrorKind::Rpc));
    assert!(err.is_retryable());
    assert!(Arc::ptr_eq(conn.adapter(), &original));
    assert_eq!(storage.calls(), 2);

    // eager path still works on the same connection afterwards
    let record = conn.get(&[alice_key()]).await.unwrap().remove(0).unwrap();
    assert_eq!(record.variant_name(), "entity");
}

#[tokio::test]
async fn adapter_restored_after_deadline() {
    let config = MemoryStorageConfig { latency_ms: 200, ..Default::default() };
    let storage = storage_with(config, &[alice()]).await;
    let mut conn = Connection::new(storage).with_deadline(Some(Duration::from_millis(10)));
    let original = Arc::clone(conn.adapter());

    let err = datastore_lazy::get(&mut conn, &[alice_key()]).await.unwrap_err();

    assert!(matches!(&err, FetchError::Store(e) if e.kind == ErrorKind::Timeout));
    assert!(Arc::ptr_eq(conn.adapter(), &original));
}

#[tokio::test]
async fn adapter_restored_when_caller_cancels() {
    let config = MemoryStorageConfig { latency_ms: 200, ..Default::default() };
    let storage = storage_with(config, &[alice()]).await;
    let mut conn = Connection::new(storage);
    let original = Arc::clone(conn.adapter());

    let outcome = tokio::time::timeout(
        Duration::from_millis(10),
        datastore_lazy::get(&mut conn, &[alice_key()]),
    )
    .await;

    assert!(outcome.is_err());
    assert!(Arc::ptr_eq(conn.adapter(), &original));
}

#[tokio::test]
async fn substitution_is_local_to_one_connection() {
    let config = MemoryStorageConfig { latency_ms: 20, ..Default::default() };
    let storage = storage_with(config, &[alice()]).await;
    let mut lazy_conn = Connection::new(storage.clone());
    let eager_conn = lazy_conn.clone();
    let keys = [alice_key()];

    let (lazy, eager) = tokio::join!(datastore_lazy::get(&mut lazy_conn, &keys), eager_conn.get(&keys));

    assert!(lazy.unwrap()[0].is_some());
    let eager = eager.unwrap().remove(0).unwrap();
    assert_eq!(eager.variant_name(), "entity");
    assert_eq!(storage.calls(), 2);
}

#[tokio::test]
async fn corrupt_field_surfaces_only_when_read() {
    let storage = Arc::new(MemoryStorage::new(&MemoryStorageConfig::default()));
    let mut proto = alice().to_proto().unwrap();
    let mut bad = datastore_api::codec::encode_field("broken", &FieldValue::Text("ok".into())).unwrap();
    bad[0].value.as_mut().unwrap().string_value = Some(vec![0xc3, 0x28]);
    proto.raw_property.extend(bad);
    storage.insert(proto).await.unwrap();

    let mut conn = Connection::new(storage.clone());

    // eager decoding fails the whole lookup
    let eager = conn.get(&[alice_key()]).await.unwrap_err();
    assert_eq!(eager.kind, ErrorKind::Format);

    let record = datastore_lazy::get(&mut conn, &[alice_key()]).await.unwrap().remove(0).unwrap();
    assert_eq!(record.get("name").unwrap().as_str(), Some("alice"));
    assert!(matches!(record.get("broken"), Err(RecordError::Decode(_))));
}
