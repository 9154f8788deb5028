pub mod kv;
pub mod sqlite;
pub mod repository;

pub use kv::*;
pub use sqlite::*;
pub use repository::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Concurrent write detected on key {key}; re-read and retry")]
    Conflict { key: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// The well-known keys of the on-device store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    UserData,
    Medications,
    BloodPressure,
    DeliveryDates,
    Caregivers,
    AppSettings,
    HasLaunched,
}

impl StorageKey {
    /// Entity keys removed by `clear_all`. `HasLaunched` survives a wipe.
    pub const ENTITY_KEYS: [StorageKey; 6] = [
        StorageKey::UserData,
        StorageKey::Medications,
        StorageKey::BloodPressure,
        StorageKey::DeliveryDates,
        StorageKey::Caregivers,
        StorageKey::AppSettings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::UserData => "user_data",
            StorageKey::Medications => "medications",
            StorageKey::BloodPressure => "blood_pressure",
            StorageKey::DeliveryDates => "delivery_dates",
            StorageKey::Caregivers => "caregivers",
            StorageKey::AppSettings => "app_settings",
            StorageKey::HasLaunched => "has_launched",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
