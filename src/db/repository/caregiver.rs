use chrono::Utc;

use super::{delete_record, get_collection, insert_record, save_collection, update_record, InsertAt};
use crate::db::{KvStore, StoreError};
use crate::models::{Caregiver, CaregiverPatch, NewCaregiver};

pub fn get_caregivers(kv: &KvStore) -> Vec<Caregiver> {
    get_collection(kv)
}

pub fn save_caregiver_list(kv: &KvStore, caregivers: &[Caregiver]) -> Result<(), StoreError> {
    save_collection(kv, caregivers)
}

/// New caregivers start active and subscribed to every alert channel
/// unless the input says otherwise.
pub fn add_caregiver(kv: &KvStore, input: NewCaregiver) -> Result<Caregiver, StoreError> {
    let NewCaregiver {
        id,
        name,
        phone,
        relationship,
        email,
        notifications,
        date_added,
    } = input;

    let caregiver = insert_record(kv, id, InsertAt::Back, |id| Caregiver {
        id,
        name,
        phone,
        relationship,
        email,
        is_active: true,
        date_added: date_added.unwrap_or_else(Utc::now),
        notifications: notifications.unwrap_or_default(),
        extra: Default::default(),
    })?;
    tracing::info!(id = %caregiver.id, "Caregiver added");
    Ok(caregiver)
}

pub fn update_caregiver(
    kv: &KvStore,
    id: &str,
    patch: CaregiverPatch,
) -> Result<Caregiver, StoreError> {
    update_record(kv, id, |c: &mut Caregiver| {
        patch.apply(c);
        Ok(())
    })
}

pub fn set_caregiver_active(kv: &KvStore, id: &str, active: bool) -> Result<Caregiver, StoreError> {
    update_caregiver(
        kv,
        id,
        CaregiverPatch {
            is_active: Some(active),
            ..Default::default()
        },
    )
}

pub fn delete_caregiver(kv: &KvStore, id: &str) -> Result<(), StoreError> {
    delete_record::<Caregiver>(kv, id)
}
