use std::time::Duration;

use serde::Deserialize;

use crate::connection::ApiVersion;
use crate::error::StoreError;

fn default_api_version() -> ApiVersion {
    ApiVersion::V3
}

/// Connection settings.
///
/// ```toml
/// [connection]
/// api_version = "datastore_v3"
/// deadline_ms = 5000
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_api_version")]
    pub api_version: ApiVersion,
    /// Per-call deadline for batch lookups. Unset means wait indefinitely.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            deadline_ms: None,
        }
    }
}

impl ConnectionConfig {
    pub fn from_json(config_json: &str) -> Result<Self, StoreError> {
        let trimmed = config_json.trim();
        if trimmed.is_empty() || trimmed == "{}" {
            return Ok(Self::default());
        }
        serde_json::from_str(config_json)
            .map_err(|e| StoreError::from(e).with_context("connection config"))
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}
