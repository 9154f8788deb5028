use super::{load_value, read_value, Loaded};
use crate::db::{KvStore, StorageKey, StoreError};
use crate::models::{UserProfile, UserProfilePatch};

/// The registered profile, or `None` before registration.
pub fn get_user_profile(kv: &KvStore) -> Option<UserProfile> {
    load_value(kv, StorageKey::UserData).value
}

/// Overwrite the profile and mark the installation as launched.
pub fn save_user_profile(kv: &KvStore, profile: &UserProfile) -> Result<(), StoreError> {
    let json = serde_json::to_string(profile)?;
    kv.set(StorageKey::UserData, &json)?;
    kv.set(StorageKey::HasLaunched, "true")?;
    tracing::info!("User profile saved");
    Ok(())
}

/// Patch the existing profile. `NotFound` before registration.
pub fn update_user_profile(
    kv: &KvStore,
    patch: UserProfilePatch,
) -> Result<UserProfile, StoreError> {
    let Loaded { value, revision } = read_value::<UserProfile>(kv, StorageKey::UserData)?;
    let mut profile = value.ok_or_else(|| StoreError::NotFound {
        entity_type: "user_profile".into(),
        id: StorageKey::UserData.as_str().into(),
    })?;
    patch.apply(&mut profile);
    let json = serde_json::to_string(&profile)?;
    kv.set_if_revision(StorageKey::UserData, &json, revision)?;
    Ok(profile)
}

/// Whether a profile has ever been saved on this installation.
/// Survives `clear_all`; drives first-run vs returning-user navigation.
pub fn has_launched(kv: &KvStore) -> bool {
    match kv.get(StorageKey::HasLaunched) {
        Ok(Some(stored)) => stored.value == "true",
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read launch flag");
            false
        }
    }
}
