use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;

use datastore_api::wire::{EntityProto, Reference};
use datastore_api::{Entity, Key, StoreError, Transport};

// ═══════════════════════════════════════════════════════════════
//  MemoryStorageConfig
// ═══════════════════════════════════════════════════════════════

fn default_max_batch() -> usize {
    1000
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MemoryStorageConfig {
    /// Simulated round-trip latency per batch lookup.
    #[serde(default)]
    pub latency_ms: u64,
    /// Largest batch accepted by a single lookup.
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
}

impl Default for MemoryStorageConfig {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            max_batch: default_max_batch(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryStorage
// ═══════════════════════════════════════════════════════════════

/// In-memory entity store answering batch lookups like the remote datastore.
/// Used for fixtures and benchmarks; entities are held in wire form.
pub struct MemoryStorage {
    records: RwLock<HashMap<Reference, EntityProto>>,
    latency: Duration,
    max_batch: usize,
    calls: AtomicU64,
}

impl MemoryStorage {
    pub fn new(config: &MemoryStorageConfig) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            latency: Duration::from_millis(config.latency_ms),
            max_batch: config.max_batch,
            calls: AtomicU64::new(0),
        }
    }

    /// Store an entity in wire form, replacing any entity with the same key.
    pub async fn insert(&self, proto: EntityProto) -> Result<(), StoreError> {
        let reference = proto
            .key
            .clone()
            .ok_or_else(|| StoreError::logic("cannot store an entity without a key"))?;
        // normalize through Key so lookups by any equivalent reference hit
        let reference = Key::from_reference(&reference)?.to_reference();
        self.records.write().await.insert(reference, proto);
        Ok(())
    }

    pub async fn insert_entity(&self, entity: &Entity) -> Result<(), StoreError> {
        self.insert(entity.to_proto()?).await
    }

    pub async fn remove(&self, key: &Key) -> Option<EntityProto> {
        self.records.write().await.remove(&key.to_reference())
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Number of batch lookups served so far, including rejected ones.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Transport for MemoryStorage {
    fn get(
        &self,
        keys: &[Reference],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Option<EntityProto>>, StoreError>> + Send + '_>> {
        let keys = keys.to_vec();
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::Relaxed);

            if keys.len() > self.max_batch {
                return Err(StoreError::rpc(format!(
                    "batch of {} keys exceeds limit of {}",
                    keys.len(),
                    self.max_batch
                )));
            }

            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            let buf = self.records.read().await;
            let result: Vec<Option<EntityProto>> =
                keys.iter().map(|k| buf.get(k).cloned()).collect();

            tracing::trace!(
                requested = keys.len(),
                found = result.iter().filter(|r| r.is_some()).count(),
                "memory lookup"
            );
            Ok(result)
        })
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryStorageFactory
// ═══════════════════════════════════════════════════════════════

pub struct MemoryStorageFactory;

impl MemoryStorageFactory {
    pub fn create(&self, config_json: &str) -> Result<Arc<MemoryStorage>, StoreError> {
        let trimmed = config_json.trim();
        let config: MemoryStorageConfig = if trimmed.is_empty() || trimmed == "{}" {
            MemoryStorageConfig::default()
        } else {
            serde_json::from_str(config_json)?
        };
        Ok(Arc::new(MemoryStorage::new(&config)))
    }
}
