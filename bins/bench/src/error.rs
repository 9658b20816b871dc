#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("no models configured")]
    NoModels,

    #[error("model '{0}' not found")]
    ModelNotFound(String),

    #[error("store: {0}")]
    Store(#[from] datastore_api::StoreError),

    #[error("parse: {0}")]
    Parse(#[from] datastore_api::ParseError),

    #[error("{0}")]
    Fetch(#[from] datastore_lazy::FetchError),

    #[error("record: {0}")]
    Record(#[from] datastore_api::RecordError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
