use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use datastore_api::ConnectionConfig;
use datastore_storage_memory::MemoryStorageConfig;

use crate::error::BenchError;

#[derive(Parser)]
#[command(name = "datastore-bench", about = "Eager vs lazy entity decoding benchmark")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Time eager and lazy batch lookups for every configured model
    Run(RunArgs),
    /// Print lazily fetched fixture entities as JSON
    Dump(DumpArgs),
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Path to TOML config file (built-in defaults if it does not exist)
    #[arg(long, default_value = "bench.toml", env = "BENCH_CONFIG")]
    pub config: String,

    /// Override `iterations` from the config
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Print the timing report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone, Debug)]
pub struct DumpArgs {
    #[arg(long, default_value = "bench.toml", env = "BENCH_CONFIG")]
    pub config: String,

    /// Model kind to dump (first configured model if omitted)
    #[arg(long)]
    pub kind: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub count: usize,

    #[arg(long)]
    pub pretty: bool,
}

// ---- TOML Config ----

#[derive(Debug, Clone, Deserialize)]
pub struct BenchConfig {
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Rounds of the byte-level serialize/deserialize measurements.
    #[serde(default = "default_serialization_iterations")]
    pub serialization_iterations: usize,
    /// Entities stored and fetched per model.
    #[serde(default = "default_instances")]
    pub instances: usize,
    /// Fixed RNG seed for reproducible fixtures.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,
    #[serde(default)]
    pub storage: MemoryStorageConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub kind: String,
    pub properties: usize,
    #[serde(default = "default_string_length")]
    pub string_length: usize,
    /// Store generated properties without an index.
    #[serde(default = "default_unindexed")]
    pub unindexed: bool,
}

fn default_iterations() -> usize {
    10
}
fn default_serialization_iterations() -> usize {
    100
}
fn default_instances() -> usize {
    20
}
fn default_string_length() -> usize {
    20
}
fn default_unindexed() -> bool {
    true
}
fn default_models() -> Vec<ModelConfig> {
    [10, 100]
        .into_iter()
        .map(|n| ModelConfig {
            kind: format!("Model{n}"),
            properties: n,
            string_length: default_string_length(),
            unindexed: default_unindexed(),
        })
        .collect()
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            serialization_iterations: default_serialization_iterations(),
            instances: default_instances(),
            seed: None,
            models: default_models(),
            storage: MemoryStorageConfig::default(),
            connection: ConnectionConfig::default(),
        }
    }
}

impl BenchConfig {
    pub fn load(path: &str) -> Result<Self, BenchError> {
        if !std::path::Path::new(path).exists() {
            tracing::info!(config = %path, "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| BenchError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        Self::parse(&content)
            .map_err(|e| BenchError::Config { context: "parse", detail: format!("'{path}': {e}") })
    }

    pub fn parse(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    pub fn model(&self, kind: Option<&str>) -> Result<&ModelConfig, BenchError> {
        match kind {
            Some(kind) => self
                .models
                .iter()
                .find(|m| m.kind == kind)
                .ok_or_else(|| BenchError::ModelNotFound(kind.to_string())),
            None => self.models.first().ok_or(BenchError::NoModels),
        }
    }
}
