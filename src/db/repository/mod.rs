//! Local Store — entity-scoped operations over the key-value store.
//!
//! Every collection lives under one key as a JSON array and is rewritten
//! whole on each change. Reads never fail: a missing key is an empty
//! collection, and read or parse failures are logged and treated the same.
//! Writes go through `set_if_revision`, so an interleaved writer surfaces as
//! `StoreError::Conflict` rather than a silently lost update.

mod blood_pressure;
mod caregiver;
mod delivery;
mod export;
mod medication;
mod profile;
mod settings;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{KvStore, StorageKey, StoreError};
use crate::models::{BloodPressureMeasurement, Caregiver, DeliveryDate, Medication};

pub use blood_pressure::*;
pub use caregiver::*;
pub use delivery::*;
pub use export::*;
pub use medication::*;
pub use profile::*;
pub use settings::*;

/// A record stored inside one of the collection keys.
pub trait CollectionRecord: Serialize + DeserializeOwned + Clone {
    const KEY: StorageKey;
    const ENTITY: &'static str;

    fn id(&self) -> &str;
}

impl CollectionRecord for Medication {
    const KEY: StorageKey = StorageKey::Medications;
    const ENTITY: &'static str = "medication";

    fn id(&self) -> &str {
        &self.id
    }
}

impl CollectionRecord for BloodPressureMeasurement {
    const KEY: StorageKey = StorageKey::BloodPressure;
    const ENTITY: &'static str = "blood_pressure";

    fn id(&self) -> &str {
        &self.id
    }
}

impl CollectionRecord for DeliveryDate {
    const KEY: StorageKey = StorageKey::DeliveryDates;
    const ENTITY: &'static str = "delivery_date";

    fn id(&self) -> &str {
        &self.id
    }
}

impl CollectionRecord for Caregiver {
    const KEY: StorageKey = StorageKey::Caregivers;
    const ENTITY: &'static str = "caregiver";

    fn id(&self) -> &str {
        &self.id
    }
}

/// A decoded value plus the revision it was read at (`None` = key absent or unreadable).
pub(crate) struct Loaded<T> {
    pub value: T,
    pub revision: Option<i64>,
}

/// Read and decode a key for a write cycle. Storage errors propagate; a blob
/// that does not parse is logged and reported as `None` with its revision
/// kept, so the next write replaces it.
pub(crate) fn read_value<T: DeserializeOwned>(
    kv: &KvStore,
    key: StorageKey,
) -> Result<Loaded<Option<T>>, StoreError> {
    let Some(stored) = kv.get(key)? else {
        return Ok(Loaded {
            value: None,
            revision: None,
        });
    };
    let value = match serde_json::from_str::<T>(&stored.value) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Stored value is not valid JSON for its type, ignoring");
            None
        }
    };
    Ok(Loaded {
        value,
        revision: Some(stored.revision),
    })
}

/// Read and decode a key for display. Never fails; errors are logged.
pub(crate) fn load_value<T: DeserializeOwned>(kv: &KvStore, key: StorageKey) -> Loaded<Option<T>> {
    read_value(kv, key).unwrap_or_else(|e| {
        tracing::warn!(key = %key, error = %e, "Failed to read key");
        Loaded {
            value: None,
            revision: None,
        }
    })
}

pub(crate) fn read_collection<T: CollectionRecord>(kv: &KvStore) -> Result<Loaded<Vec<T>>, StoreError> {
    let loaded = read_value::<Vec<T>>(kv, T::KEY)?;
    Ok(Loaded {
        value: loaded.value.unwrap_or_default(),
        revision: loaded.revision,
    })
}

pub(crate) fn load_collection<T: CollectionRecord>(kv: &KvStore) -> Loaded<Vec<T>> {
    let loaded = load_value::<Vec<T>>(kv, T::KEY);
    Loaded {
        value: loaded.value.unwrap_or_default(),
        revision: loaded.revision,
    }
}

/// Whole collection, or empty.
pub fn get_collection<T: CollectionRecord>(kv: &KvStore) -> Vec<T> {
    load_collection(kv).value
}

/// Overwrite a collection wholesale.
pub fn save_collection<T: CollectionRecord>(kv: &KvStore, items: &[T]) -> Result<(), StoreError> {
    let json = serde_json::to_string(items)?;
    kv.set(T::KEY, &json)?;
    tracing::debug!(key = %T::KEY, count = items.len(), "Collection saved");
    Ok(())
}

/// Read, mutate, write back. `f` returns its output and whether the
/// collection changed; unchanged collections are not rewritten.
pub(crate) fn modify_collection<T, R>(
    kv: &KvStore,
    f: impl FnOnce(&mut Vec<T>) -> Result<(R, bool), StoreError>,
) -> Result<R, StoreError>
where
    T: CollectionRecord,
{
    let Loaded { value: mut items, revision } = read_collection::<T>(kv)?;
    let (out, changed) = f(&mut items)?;
    if changed {
        let json = serde_json::to_string(&items)?;
        kv.set_if_revision(T::KEY, &json, revision)?;
    }
    Ok(out)
}

/// Where `insert_record` places the new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsertAt {
    Front,
    Back,
}

/// Append (or prepend) a record built from a fresh or caller-supplied id.
pub(crate) fn insert_record<T: CollectionRecord>(
    kv: &KvStore,
    requested_id: Option<String>,
    at: InsertAt,
    build: impl FnOnce(String) -> T,
) -> Result<T, StoreError> {
    modify_collection::<T, T>(kv, |items| {
        let id = match requested_id {
            Some(id) if !id.is_empty() && !items.iter().any(|r| r.id() == id) => id,
            Some(id) if !id.is_empty() => {
                tracing::warn!(entity = T::ENTITY, %id, "Requested id already in use, assigning a new one");
                generate_id(items)
            }
            _ => generate_id(items),
        };
        let record = build(id);
        match at {
            InsertAt::Front => items.insert(0, record.clone()),
            InsertAt::Back => items.push(record.clone()),
        }
        Ok((record, true))
    })
}

/// Locate a record by id and edit it in place.
pub(crate) fn update_record<T: CollectionRecord>(
    kv: &KvStore,
    id: &str,
    edit: impl FnOnce(&mut T) -> Result<(), StoreError>,
) -> Result<T, StoreError> {
    modify_collection::<T, T>(kv, |items| {
        let record = items
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| StoreError::NotFound {
                entity_type: T::ENTITY.into(),
                id: id.into(),
            })?;
        edit(record)?;
        Ok((record.clone(), true))
    })
}

/// Remove by id. Absent ids leave the stored blob untouched.
pub(crate) fn delete_record<T: CollectionRecord>(kv: &KvStore, id: &str) -> Result<(), StoreError> {
    let removed = modify_collection::<T, bool>(kv, |items| {
        let before = items.len();
        items.retain(|r| r.id() != id);
        let changed = items.len() != before;
        Ok((changed, changed))
    })?;
    if !removed {
        tracing::debug!(entity = T::ENTITY, %id, "Delete of absent id is a no-op");
    }
    Ok(())
}

/// Find a record by id.
pub fn find_record<T: CollectionRecord>(kv: &KvStore, id: &str) -> Option<T> {
    get_collection::<T>(kv).into_iter().find(|r| r.id() == id)
}

/// Timestamp-derived id (milliseconds), bumped until unique in `existing`.
pub(crate) fn generate_id<T: CollectionRecord>(existing: &[T]) -> String {
    let mut candidate = Utc::now().timestamp_millis();
    while existing.iter().any(|r| r.id() == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}
