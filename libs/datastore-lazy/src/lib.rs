//! Lazy batch lookups.
//!
//! Decoding an entity with many properties is dominated by per-property type
//! conversion. [`get`] fetches through the caller's own [`Connection`] but swaps
//! its adapter for a [`LazyAdapter`] for the duration of the call, so every hit
//! comes back as a [`LazyRecord`] that converts a property only when it is read.

pub mod adapter;
pub mod error;
pub mod guard;

use std::sync::Arc;

use datastore_api::{Adapter, ApiVersion, Connection, FieldDecoder, Key, LazyRecord, PropertyDecoder, Record};

pub use adapter::LazyAdapter;
pub use error::FetchError;
pub use guard::AdapterGuard;

/// The only API whose entity layout [`LazyAdapter`] understands.
pub const SUPPORTED_API_VERSION: ApiVersion = ApiVersion::V3;

/// Fetch `keys` as lazy records, one slot per key; `None` for a missing entity.
///
/// The connection's adapter is substituted only while the lookup runs and is
/// restored before this returns, fails, or is cancelled.
pub async fn get(conn: &mut Connection, keys: &[Key]) -> Result<Vec<Option<LazyRecord>>, FetchError> {
    get_with_decoder(conn, keys, Arc::new(PropertyDecoder)).await
}

/// [`get`] with a caller-supplied field decoder for the returned records.
pub async fn get_with_decoder(
    conn: &mut Connection,
    keys: &[Key],
    decoder: Arc<dyn FieldDecoder>,
) -> Result<Vec<Option<LazyRecord>>, FetchError> {
    let api_version = conn.api_version();
    if api_version != SUPPORTED_API_VERSION {
        tracing::warn!(%api_version, "lazy get refused: unsupported API version");
        return Err(FetchError::UnsupportedApiVersion(api_version));
    }

    tracing::debug!(keys = keys.len(), "lazy get");
    let fetched = {
        let guard = AdapterGuard::install(conn, |real| {
            Arc::new(LazyAdapter::new(real, decoder)) as Arc<dyn Adapter>
        });
        guard.connection().get(keys).await
    };

    fetched?
        .into_iter()
        .map(|slot| {
            slot.map(|record| match record {
                Record::Lazy(lazy) => Ok(lazy),
                other => Err(FetchError::UnexpectedRecord(other.variant_name())),
            })
            .transpose()
        })
        .collect()
}
