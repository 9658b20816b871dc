//! Generated fixture entities: `prop_a`, `prop_b`, ... filled with random lowercase strings.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use datastore_api::{Entity, FieldValue, Key, StoreError};
use datastore_storage_memory::MemoryStorage;

use crate::config::ModelConfig;

pub const APP: &str = "bench";

const LETTERS: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

/// Little-endian base 26: `0 → a`, `25 → z`, `26 → ab`.
fn base26(mut i: usize) -> String {
    let mut out = String::new();
    loop {
        out.push(LETTERS[i % LETTERS.len()] as char);
        i /= LETTERS.len();
        if i == 0 {
            break;
        }
    }
    out
}

pub fn property_name(i: usize) -> String {
    format!("prop_{}", base26(i))
}

pub fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub fn random_string(rng: &mut impl Rng, len: usize) -> String {
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

pub fn instance(model: &ModelConfig, id: i64, rng: &mut impl Rng) -> Entity {
    let mut entity = Entity::new(Key::with_id(APP, model.kind.as_str(), id));
    for i in 0..model.properties {
        let value = FieldValue::String(random_string(rng, model.string_length));
        if model.unindexed {
            entity.set_unindexed(property_name(i), value);
        } else {
            entity.set(property_name(i), value);
        }
    }
    entity
}

/// Store `count` fresh instances of `model` and return their keys.
pub async fn seed(
    storage: &MemoryStorage,
    model: &ModelConfig,
    count: usize,
    rng: &mut impl Rng,
) -> Result<Vec<Key>, StoreError> {
    let mut keys = Vec::with_capacity(count);
    for id in 1..=count as i64 {
        let entity = instance(model, id, rng);
        storage.insert_entity(&entity).await?;
        keys.push(entity.key().clone());
    }
    tracing::debug!(kind = %model.kind, count, "seeded fixtures");
    Ok(keys)
}
