use super::{load_value, read_value, Loaded};
use crate::db::{KvStore, StorageKey, StoreError};
use crate::models::{AppSettings, SettingsPatch};

/// Current settings. On first read the defaults are persisted; an unreadable
/// blob yields defaults without being overwritten.
pub fn get_app_settings(kv: &KvStore) -> AppSettings {
    let Loaded { value, revision } = load_value::<AppSettings>(kv, StorageKey::AppSettings);
    match (value, revision) {
        (Some(settings), _) => settings,
        (None, Some(_)) => AppSettings::default(),
        (None, None) => {
            let defaults = AppSettings::default();
            if let Err(e) = persist_defaults(kv, &defaults) {
                tracing::warn!(error = %e, "Could not persist default settings");
            }
            defaults
        }
    }
}

fn persist_defaults(kv: &KvStore, defaults: &AppSettings) -> Result<(), StoreError> {
    let json = serde_json::to_string(defaults)?;
    match kv.set_if_revision(StorageKey::AppSettings, &json, None) {
        // Someone else created the key first; theirs wins.
        Ok(_) | Err(StoreError::Conflict { .. }) => Ok(()),
        Err(e) => Err(e),
    }
}

pub fn save_app_settings(kv: &KvStore, settings: &AppSettings) -> Result<(), StoreError> {
    let json = serde_json::to_string(settings)?;
    kv.set(StorageKey::AppSettings, &json)?;
    Ok(())
}

/// Patch the stored settings (defaults when absent).
pub fn update_app_settings(kv: &KvStore, patch: SettingsPatch) -> Result<AppSettings, StoreError> {
    let Loaded { value, revision } = read_value::<AppSettings>(kv, StorageKey::AppSettings)?;
    let mut settings = value.unwrap_or_default();
    patch.apply(&mut settings);
    let json = serde_json::to_string(&settings)?;
    kv.set_if_revision(StorageKey::AppSettings, &json, revision)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_store;

    #[test]
    fn first_read_creates_defaults() {
        let kv = test_store();
        assert_eq!(get_app_settings(&kv), AppSettings::default());
        let stored = kv.get(StorageKey::AppSettings).unwrap().unwrap();
        let parsed: AppSettings = serde_json::from_str(&stored.value).unwrap();
        assert_eq!(parsed, AppSettings::default());
    }

    #[test]
    fn corrupt_settings_yield_defaults_without_overwrite() {
        let kv = test_store();
        kv.set(StorageKey::AppSettings, "not json").unwrap();
        assert_eq!(get_app_settings(&kv), AppSettings::default());
        assert_eq!(kv.get(StorageKey::AppSettings).unwrap().unwrap().value, "not json");
    }

    #[test]
    fn save_round_trips() {
        let kv = test_store();
        let settings = AppSettings {
            dark_mode: true,
            premium: true,
            language: "en".into(),
            ..Default::default()
        };
        save_app_settings(&kv, &settings).unwrap();
        assert_eq!(get_app_settings(&kv), settings);
    }

    #[test]
    fn update_applies_patch_over_defaults() {
        let kv = test_store();
        let updated = update_app_settings(
            &kv,
            SettingsPatch {
                notifications: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!updated.notifications);
        assert_eq!(get_app_settings(&kv), updated);
    }
}
