use std::sync::Arc;

use serde_json::{Map, Value, json};

use datastore_api::{Connection, LazyRecord};
use datastore_storage_memory::MemoryStorage;

use crate::config::{BenchConfig, DumpArgs};
use crate::error::BenchError;
use crate::fixture;

pub async fn run(args: DumpArgs) -> Result<(), BenchError> {
    let config = BenchConfig::load(&args.config)?;
    let model = config.model(args.kind.as_deref())?;

    let storage = Arc::new(MemoryStorage::new(&config.storage));
    let mut conn = Connection::from_config(storage.clone(), &config.connection);
    let mut rng = fixture::rng(config.seed);
    let keys = fixture::seed(&storage, model, args.count, &mut rng).await?;

    let records = datastore_lazy::get(&mut conn, &keys).await?;
    let dumped = records
        .iter()
        .flatten()
        .map(record_json)
        .collect::<Result<Vec<_>, _>>()?;

    let out = if args.pretty {
        serde_json::to_string_pretty(&dumped)?
    } else {
        serde_json::to_string(&dumped)?
    };
    println!("{out}");
    Ok(())
}

/// Every property decoded, keyed by name in sorted order.
fn record_json(record: &LazyRecord) -> Result<Value, BenchError> {
    let entity = record.to_entity()?;
    let properties: Map<String, Value> =
        entity.iter().map(|(name, value)| (name.to_string(), value.to_json())).collect();
    Ok(json!({
        "key": record.key().to_string(),
        "kind": record.kind(),
        "properties": properties,
    }))
}
