use chrono::Utc;

use super::{
    get_blood_pressure_history, get_caregivers, get_delivery_dates, get_medications, get_user_profile, load_value,
};
use crate::config;
use crate::db::{KvStore, StorageKey, StoreError};
use crate::models::{AppSettings, ExportSnapshot};

/// Remove all six entity keys in one transaction.
pub fn clear_all(kv: &KvStore) -> Result<(), StoreError> {
    kv.remove_many(&StorageKey::ENTITY_KEYS)?;
    tracing::info!("All local data cleared");
    Ok(())
}

/// Aggregate of every entity key, stamped with export time and app version.
/// Read-only: absent settings are reported as defaults, not persisted.
pub fn export_all(kv: &KvStore) -> ExportSnapshot {
    ExportSnapshot {
        user_data: get_user_profile(kv),
        medications: get_medications(kv),
        blood_pressure: get_blood_pressure_history(kv),
        delivery_dates: get_delivery_dates(kv),
        caregivers: get_caregivers(kv),
        settings: load_value::<AppSettings>(kv, StorageKey::AppSettings)
            .value
            .unwrap_or_default(),
        export_date: Utc::now(),
        app_version: config::APP_VERSION.to_string(),
    }
}
