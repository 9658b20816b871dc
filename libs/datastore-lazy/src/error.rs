use datastore_api::{ApiVersion, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("unsupported API version: {0}")]
    UnsupportedApiVersion(ApiVersion),

    #[error("fetch: {0}")]
    Store(#[from] StoreError),

    #[error("adapter produced a {0} record instead of a lazy one")]
    UnexpectedRecord(&'static str),
}

impl FetchError {
    /// Only transport failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Store(e) if matches!(e.kind, datastore_api::ErrorKind::Rpc | datastore_api::ErrorKind::Timeout)
        )
    }
}
