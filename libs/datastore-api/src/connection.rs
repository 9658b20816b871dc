use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::adapter::{Adapter, ModelAdapter, Record};
use crate::config::ConnectionConfig;
use crate::error::StoreError;
use crate::key::Key;
use crate::wire::{EntityProto, Reference};

/// Datastore RPC API spoken by a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ApiVersion {
    #[serde(rename = "datastore_v3")]
    V3,
    #[serde(rename = "datastore_v4")]
    V4,
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiVersion::V3 => write!(f, "datastore_v3"),
            ApiVersion::V4 => write!(f, "datastore_v4"),
        }
    }
}

/// Batch lookup RPC.
///
/// Returns one slot per requested reference, in request order; `None` means
/// the store has no entity for that key.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        keys: &[Reference],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Option<EntityProto>>, StoreError>> + Send + '_>>;
}

/// Connection handle owned by one execution context.
///
/// Cloning yields an independent handle: the adapter slot is per handle while
/// the transport is shared. Hand each worker its own clone.
#[derive(Clone)]
pub struct Connection {
    api_version: ApiVersion,
    adapter: Arc<dyn Adapter>,
    transport: Arc<dyn Transport>,
    deadline: Option<Duration>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("api_version", &self.api_version)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Connection {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::from_config(transport, &ConnectionConfig::default())
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &ConnectionConfig) -> Self {
        Self {
            api_version: config.api_version,
            adapter: Arc::new(ModelAdapter),
            transport,
            deadline: config.deadline(),
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn Adapter>) -> Self {
        self.adapter = adapter;
        self
    }

    pub fn with_api_version(mut self, api_version: ApiVersion) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    /// Install `adapter` and return the one it replaces.
    pub fn replace_adapter(&mut self, adapter: Arc<dyn Adapter>) -> Arc<dyn Adapter> {
        std::mem::replace(&mut self.adapter, adapter)
    }

    /// Batch lookup by key, converting every hit with the current adapter.
    ///
    /// Results line up with `keys`; a missing entity is `None`.
    pub async fn get(&self, keys: &[Key]) -> Result<Vec<Option<Record>>, StoreError> {
        let adapter = Arc::clone(&self.adapter);
        let references: Vec<Reference> = keys.iter().map(|k| adapter.encode_key(k)).collect();

        let call = self.transport.get(&references);
        let raw = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, call).await.map_err(|e| {
                tracing::warn!(keys = keys.len(), ?deadline, "datastore get timed out");
                StoreError::from(e)
            })??,
            None => call.await?,
        };

        if raw.len() != keys.len() {
            return Err(StoreError::logic(format!(
                "transport returned {} results for {} keys",
                raw.len(),
                keys.len()
            )));
        }

        raw.into_iter()
            .zip(keys)
            .map(|(pb, key)| {
                pb.map(|pb| adapter.decode_record(pb).map_err(|e| e.with_context(key)))
                    .transpose()
            })
            .collect()
    }
}
