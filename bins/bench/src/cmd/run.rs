use std::sync::Arc;
use std::time::{Duration, Instant};

use prost::Message;
use rand::Rng;
use serde::Serialize;

use datastore_api::wire::EntityProto;
use datastore_api::{Connection, Entity, Key, LazyRecord, ParseError, Record, StoreError};
use datastore_storage_memory::MemoryStorage;

use crate::config::{BenchConfig, ModelConfig, RunArgs};
use crate::error::BenchError;
use crate::fixture;

#[derive(Debug, Serialize)]
struct ModelReport {
    kind: String,
    properties: usize,
    instances: usize,
    iterations: usize,
    timings: Vec<Timing>,
}

#[derive(Debug, Serialize)]
struct Timing {
    label: &'static str,
    total_ms: f64,
    per_iteration_ms: f64,
}

impl Timing {
    fn new(label: &'static str, total: Duration, iterations: usize) -> Self {
        let total_ms = total.as_secs_f64() * 1000.0;
        Self { label, total_ms, per_iteration_ms: total_ms / iterations.max(1) as f64 }
    }
}

pub async fn run(args: RunArgs) -> Result<(), BenchError> {
    let mut config = BenchConfig::load(&args.config)?;
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    if config.models.is_empty() {
        return Err(BenchError::NoModels);
    }

    tracing::info!(
        iterations = config.iterations,
        instances = config.instances,
        models = config.models.len(),
        api_version = %config.connection.api_version,
        "Starting benchmark"
    );

    let storage = Arc::new(MemoryStorage::new(&config.storage));
    let mut conn = Connection::from_config(storage.clone(), &config.connection);
    let mut rng = fixture::rng(config.seed);

    let mut reports = Vec::with_capacity(config.models.len());
    for model in &config.models {
        let keys = fixture::seed(&storage, model, config.instances, &mut rng).await?;
        let mut report = bench_model(&mut conn, model, &keys, config.iterations).await?;
        report
            .timings
            .extend(bench_serialization(model, &mut rng, config.serialization_iterations)?);
        for t in &report.timings {
            tracing::info!(
                kind = %report.kind,
                label = t.label,
                total_ms = %format!("{:.3}", t.total_ms),
                per_iteration_ms = %format!("{:.3}", t.per_iteration_ms),
                "timing"
            );
        }
        reports.push(report);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    tracing::info!(lookups = storage.calls(), "Benchmark finished");
    Ok(())
}

async fn bench_model(
    conn: &mut Connection,
    model: &ModelConfig,
    keys: &[Key],
    iterations: usize,
) -> Result<ModelReport, BenchError> {
    let one: Vec<String> = (0..model.properties.min(1)).map(fixture::property_name).collect();
    let five: Vec<String> = (0..model.properties.min(5)).map(fixture::property_name).collect();

    let mut timings = Vec::new();
    for (label, lazy, names) in [
        ("eager get", false, &[][..]),
        ("eager get + read 1", false, &one[..]),
        ("eager get + read 5", false, &five[..]),
        ("lazy get", true, &[][..]),
        ("lazy get + read 1", true, &one[..]),
        ("lazy get + read 5", true, &five[..]),
    ] {
        let start = Instant::now();
        for _ in 0..iterations {
            if lazy {
                lazy_get(conn, keys, names).await?;
            } else {
                eager_get(conn, keys, names).await?;
            }
        }
        timings.push(Timing::new(label, start.elapsed(), iterations));
    }

    Ok(ModelReport {
        kind: model.kind.clone(),
        properties: model.properties,
        instances: keys.len(),
        iterations,
        timings,
    })
}

/// Byte-level round trips of one fixture entity, no lookup involved.
fn bench_serialization(
    model: &ModelConfig,
    rng: &mut impl Rng,
    iterations: usize,
) -> Result<Vec<Timing>, BenchError> {
    let entity = fixture::instance(model, 1, rng);
    let proto = entity.to_proto().map_err(StoreError::from)?;
    let bytes = proto.encode_to_vec();
    let one: Vec<String> = (0..model.properties.min(1)).map(fixture::property_name).collect();
    let five: Vec<String> = (0..model.properties.min(5)).map(fixture::property_name).collect();

    let mut timings = Vec::new();

    let start = Instant::now();
    for _ in 0..iterations {
        let proto = entity.to_proto().map_err(StoreError::from)?;
        std::hint::black_box(proto.encode_to_vec());
    }
    timings.push(Timing::new("serialize entity", start.elapsed(), iterations));

    let start = Instant::now();
    for _ in 0..iterations {
        std::hint::black_box(EntityProto::decode(bytes.as_slice()).map_err(ParseError::from)?);
    }
    timings.push(Timing::new("parse wire message", start.elapsed(), iterations));

    for (label, names) in [
        ("eager deserialize", &[][..]),
        ("eager deserialize + read 1", &one[..]),
        ("eager deserialize + read 5", &five[..]),
    ] {
        let start = Instant::now();
        for _ in 0..iterations {
            let entity = Entity::deserialize(&bytes)?;
            for name in names {
                std::hint::black_box(entity.get(name));
            }
        }
        timings.push(Timing::new(label, start.elapsed(), iterations));
    }

    for (label, names) in [
        ("lazy deserialize", &[][..]),
        ("lazy deserialize + read 1", &one[..]),
        ("lazy deserialize + read 5", &five[..]),
    ] {
        let start = Instant::now();
        for _ in 0..iterations {
            let record = LazyRecord::deserialize(&bytes)?;
            for name in names {
                std::hint::black_box(record.get(name)?);
            }
        }
        timings.push(Timing::new(label, start.elapsed(), iterations));
    }

    Ok(timings)
}

async fn eager_get(conn: &Connection, keys: &[Key], names: &[String]) -> Result<(), BenchError> {
    for record in conn.get(keys).await?.into_iter().flatten() {
        if let Record::Entity(entity) = record {
            for name in names {
                std::hint::black_box(entity.get(name));
            }
        }
    }
    Ok(())
}

async fn lazy_get(conn: &mut Connection, keys: &[Key], names: &[String]) -> Result<(), BenchError> {
    for record in datastore_lazy::get(conn, keys).await?.into_iter().flatten() {
        for name in names {
            std::hint::black_box(record.get(name)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use datastore_storage_memory::MemoryStorageConfig;

    use super::*;

    #[tokio::test]
    async fn bench_model_reports_every_measurement() {
        let storage = Arc::new(MemoryStorage::new(&MemoryStorageConfig::default()));
        let mut conn = Connection::new(storage.clone());
        let model = ModelConfig {
            kind: "Model3".into(),
            properties: 3,
            string_length: 4,
            unindexed: true,
        };
        let keys = fixture::seed(&storage, &model, 2, &mut fixture::rng(Some(1))).await.unwrap();

        let report = bench_model(&mut conn, &model, &keys, 2).await.unwrap();

        let labels: Vec<_> = report.timings.iter().map(|t| t.label).collect();
        assert_eq!(
            labels,
            [
                "eager get",
                "eager get + read 1",
                "eager get + read 5",
                "lazy get",
                "lazy get + read 1",
                "lazy get + read 5",
            ]
        );
        assert_eq!(report.instances, 2);
        // six measurements of two iterations, one batch lookup each
        assert_eq!(storage.calls(), 12);
    }

    #[test]
    fn serialization_reports_every_measurement() {
        let model = ModelConfig {
            kind: "Model7".into(),
            properties: 7,
            string_length: 20,
            unindexed: true,
        };

        let timings = bench_serialization(&model, &mut fixture::rng(Some(2)), 3).unwrap();

        let labels: Vec<_> = timings.iter().map(|t| t.label).collect();
        assert_eq!(
            labels,
            [
                "serialize entity",
                "parse wire message",
                "eager deserialize",
                "eager deserialize + read 1",
                "eager deserialize + read 5",
                "lazy deserialize",
                "lazy deserialize + read 1",
                "lazy deserialize + read 5",
            ]
        );
        assert!(timings.iter().all(|t| t.total_ms >= 0.0));
    }

    #[test]
    fn serialization_handles_models_narrower_than_five() {
        let model = ModelConfig {
            kind: "Model2".into(),
            properties: 2,
            string_length: 5,
            unindexed: false,
        };
        assert_eq!(bench_serialization(&model, &mut fixture::rng(Some(4)), 1).unwrap().len(), 8);
    }
}
