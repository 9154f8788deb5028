use chrono::Utc;

use super::{delete_record, get_collection, insert_record, save_collection, update_record, InsertAt};
use crate::db::{KvStore, StoreError};
use crate::models::{BloodPressureMeasurement, BloodPressurePatch, BpCategory, NewBloodPressure};

/// Blood-pressure history, newest first. Never fails.
pub fn get_blood_pressure_history(kv: &KvStore) -> Vec<BloodPressureMeasurement> {
    get_collection(kv)
}

/// Replace the whole history.
pub fn save_blood_pressure_list(
    kv: &KvStore,
    readings: &[BloodPressureMeasurement],
) -> Result<(), StoreError> {
    save_collection(kv, readings)
}

/// Record a reading at the front of the history, with its category derived.
///
/// No range or systolic > diastolic check happens here; see
/// `validation::validate_blood_pressure_input`.
pub fn add_blood_pressure(
    kv: &KvStore,
    input: NewBloodPressure,
) -> Result<BloodPressureMeasurement, StoreError> {
    let NewBloodPressure {
        id,
        systolic,
        diastolic,
        pulse,
        notes,
        created_at,
    } = input;

    let reading = insert_record(kv, id, InsertAt::Front, |id| BloodPressureMeasurement {
        id,
        systolic,
        diastolic,
        pulse,
        category: BpCategory::classify(systolic, diastolic),
        notes,
        created_at: created_at.unwrap_or_else(Utc::now),
        extra: Default::default(),
    })?;
    tracing::info!(id = %reading.id, category = %reading.category, "Blood pressure recorded");
    Ok(reading)
}

pub fn update_blood_pressure(
    kv: &KvStore,
    id: &str,
    patch: BloodPressurePatch,
) -> Result<BloodPressureMeasurement, StoreError> {
    update_record(kv, id, |m: &mut BloodPressureMeasurement| {
        patch.apply(m);
        Ok(())
    })
}

pub fn delete_blood_pressure(kv: &KvStore, id: &str) -> Result<(), StoreError> {
    delete_record::<BloodPressureMeasurement>(kv, id)
}
