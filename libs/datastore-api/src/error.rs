use std::fmt;

/// Error kind for store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Rpc,
    Timeout,
    Format,
    Logic,
}

/// Error returned by transports, adapters and the connection.
#[derive(Debug)]
pub struct StoreError {
    pub kind: ErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    pub fn rpc(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Rpc, message: msg.into() }
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Timeout, message: msg.into() }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Format, message: msg.into() }
    }

    pub fn logic(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Logic, message: msg.into() }
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for StoreError {}

/// Raw record bytes or structure are not a well-formed entity.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed entity: {0}")]
    Wire(#[from] prost::DecodeError),

    #[error("entity has no key")]
    MissingKey,

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("property '{0}' is both single-valued and multi-valued")]
    MixedMultiplicity(String),
}

/// A property payload could not be converted to its declared type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("property '{property}': {reason}")]
pub struct DecodeError {
    pub property: String,
    pub reason: String,
}

impl DecodeError {
    pub fn new(property: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { property: property.into(), reason: reason.into() }
    }
}

/// A value could not be expressed as a wire property.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("property '{property}': {reason}")]
pub struct EncodeError {
    pub property: String,
    pub reason: String,
}

/// Field access on a single record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("entity for kind '{kind}' has no property '{property}'")]
    NotFound { kind: String, property: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl RecordError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecordError::NotFound { .. })
    }
}

// ---------------------------------------------------------------------------
// From impls: codec and standard error types → StoreError with correct ErrorKind
// ---------------------------------------------------------------------------

impl From<ParseError> for StoreError {
    fn from(e: ParseError) -> Self {
        Self::format(e.to_string())
    }
}

impl From<DecodeError> for StoreError {
    fn from(e: DecodeError) -> Self {
        Self::format(e.to_string())
    }
}

impl From<EncodeError> for StoreError {
    fn from(e: EncodeError) -> Self {
        Self::format(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::rpc(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::config(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for StoreError {
    fn from(e: tokio::time::error::Elapsed) -> Self {
        Self::timeout(e.to_string())
    }
}
