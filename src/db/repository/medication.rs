use chrono::Utc;

use super::{delete_record, get_collection, insert_record, save_collection, update_record, InsertAt};
use crate::db::{KvStore, StoreError};
use crate::models::{Medication, MedicationPatch, MedicationStatus, NewMedication};

/// All medications in insertion order. Never fails.
pub fn get_medications(kv: &KvStore) -> Vec<Medication> {
    get_collection(kv)
}

/// Replace the whole medication list.
pub fn save_medication_list(kv: &KvStore, meds: &[Medication]) -> Result<(), StoreError> {
    save_collection(kv, meds)
}

/// Append a new medication. It always starts `pending` with no `lastTaken`.
pub fn add_medication(kv: &KvStore, input: NewMedication) -> Result<Medication, StoreError> {
    let NewMedication {
        id,
        name,
        dosage,
        schedule,
        frequency,
        instructions,
        next_delivery,
        created_at,
    } = input;

    let med = insert_record(kv, id, InsertAt::Back, |id| Medication {
        id,
        name,
        dosage,
        schedule,
        frequency,
        instructions,
        next_delivery,
        status: MedicationStatus::Pending,
        created_at: created_at.unwrap_or_else(Utc::now),
        last_taken: None,
        extra: Default::default(),
    })?;
    tracing::info!(id = %med.id, "Medication added");
    Ok(med)
}

/// Apply a patch. A status change must be an allowed transition; moving to
/// `taken` without an explicit `last_taken` stamps the current time.
pub fn update_medication(
    kv: &KvStore,
    id: &str,
    mut patch: MedicationPatch,
) -> Result<Medication, StoreError> {
    update_record(kv, id, |med: &mut Medication| {
        if let Some(next) = patch.status {
            check_transition(med.status, next)?;
            if next == MedicationStatus::Taken
                && med.status != MedicationStatus::Taken
                && patch.last_taken.is_none()
            {
                patch.last_taken = Some(Some(Utc::now()));
            }
        }
        patch.apply(med);
        Ok(())
    })
}

/// Record a dose. The only way out of `overdue` into `taken`.
pub fn mark_medication_taken(kv: &KvStore, id: &str) -> Result<Medication, StoreError> {
    let med = update_record(kv, id, |med: &mut Medication| {
        if med.status == MedicationStatus::Taken {
            return Err(invalid(med.status, MedicationStatus::Taken));
        }
        med.status = MedicationStatus::Taken;
        med.last_taken = Some(Utc::now());
        Ok(())
    })?;
    tracing::info!(id = %med.id, "Medication marked as taken");
    Ok(med)
}

/// Pending dose whose time has passed.
pub fn mark_medication_overdue(kv: &KvStore, id: &str) -> Result<Medication, StoreError> {
    update_medication(kv, id, MedicationPatch::status(MedicationStatus::Overdue))
}

/// Start a new schedule cycle: taken -> pending. `lastTaken` is kept.
pub fn reset_medication_cycle(kv: &KvStore, id: &str) -> Result<Medication, StoreError> {
    update_medication(kv, id, MedicationPatch::status(MedicationStatus::Pending))
}

pub fn delete_medication(kv: &KvStore, id: &str) -> Result<(), StoreError> {
    delete_record::<Medication>(kv, id)
}

fn check_transition(from: MedicationStatus, to: MedicationStatus) -> Result<(), StoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(invalid(from, to))
    }
}

fn invalid(from: MedicationStatus, to: MedicationStatus) -> StoreError {
    StoreError::InvalidTransition {
        from: from.as_str().into(),
        to: to.as_str().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_store;
    use crate::db::StorageKey;

    fn losartan() -> NewMedication {
        NewMedication {
            name: "Losartán".into(),
            dosage: "50mg".into(),
            schedule: "08:00".into(),
            ..Default::default()
        }
    }

    #[test]
    fn add_assigns_id_and_pending_status() {
        let kv = test_store();
        let med = add_medication(&kv, losartan()).unwrap();
        assert!(!med.id.is_empty());
        assert_eq!(med.status, MedicationStatus::Pending);
        assert!(med.last_taken.is_none());

        let stored = get_medications(&kv);
        assert_eq!(stored, vec![med]);
    }

    #[test]
    fn stored_json_has_null_last_taken() {
        let kv = test_store();
        add_medication(&kv, losartan()).unwrap();
        let raw = kv.get(StorageKey::Medications).unwrap().unwrap().value;
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[0]["status"], "pending");
        assert!(json[0]["lastTaken"].is_null());
    }

    #[test]
    fn losartan_lifecycle() {
        let kv = test_store();
        let med = add_medication(&kv, losartan()).unwrap();

        let before = Utc::now();
        let taken = mark_medication_taken(&kv, &med.id).unwrap();
        assert_eq!(taken.status, MedicationStatus::Taken);
        assert!(taken.last_taken.unwrap() >= before);

        delete_medication(&kv, &med.id).unwrap();
        assert!(get_medications(&kv).is_empty());
    }

    #[test]
    fn update_to_taken_stamps_last_taken() {
        let kv = test_store();
        let med = add_medication(&kv, losartan()).unwrap();
        let before = Utc::now();

        let updated =
            update_medication(&kv, &med.id, MedicationPatch::status(MedicationStatus::Taken))
                .unwrap();
        assert_eq!(updated.status, MedicationStatus::Taken);
        assert!(updated.last_taken.unwrap() >= before);
        assert_eq!(get_medications(&kv)[0], updated);
    }

    #[test]
    fn update_missing_id_fails_without_mutation() {
        let kv = test_store();
        add_medication(&kv, losartan()).unwrap();
        let before = kv.get(StorageKey::Medications).unwrap().unwrap();

        let result = update_medication(&kv, "nope", MedicationPatch::status(MedicationStatus::Taken));
        assert!(matches!(result, Err(StoreError::NotFound { .. })));

        let after = kv.get(StorageKey::Medications).unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn overdue_cannot_be_patched_to_taken() {
        let kv = test_store();
        let med = add_medication(&kv, losartan()).unwrap();
        mark_medication_overdue(&kv, &med.id).unwrap();

        let result = update_medication(&kv, &med.id, MedicationPatch::status(MedicationStatus::Taken));
        assert!(matches!(result, Err(StoreError::InvalidTransition { .. })));
        assert_eq!(get_medications(&kv)[0].status, MedicationStatus::Overdue);
    }

    #[test]
    fn overdue_can_be_marked_taken() {
        let kv = test_store();
        let med = add_medication(&kv, losartan()).unwrap();
        mark_medication_overdue(&kv, &med.id).unwrap();

        let taken = mark_medication_taken(&kv, &med.id).unwrap();
        assert_eq!(taken.status, MedicationStatus::Taken);
        assert!(taken.last_taken.is_some());
    }

    #[test]
    fn marking_taken_twice_is_rejected() {
        let kv = test_store();
        let med = add_medication(&kv, losartan()).unwrap();
        mark_medication_taken(&kv, &med.id).unwrap();
        let again = mark_medication_taken(&kv, &med.id);
        assert!(matches!(again, Err(StoreError::InvalidTransition { .. })));
    }

    #[test]
    fn reset_cycle_returns_to_pending_keeping_last_taken() {
        let kv = test_store();
        let med = add_medication(&kv, losartan()).unwrap();
        let taken = mark_medication_taken(&kv, &med.id).unwrap();

        let reset = reset_medication_cycle(&kv, &med.id).unwrap();
        assert_eq!(reset.status, MedicationStatus::Pending);
        assert_eq!(reset.last_taken, taken.last_taken);
    }

    #[test]
    fn patch_without_status_keeps_status() {
        let kv = test_store();
        let med = add_medication(&kv, losartan()).unwrap();
        let updated = update_medication(
            &kv,
            &med.id,
            MedicationPatch {
                dosage: Some("100mg".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.dosage, "100mg");
        assert_eq!(updated.status, MedicationStatus::Pending);
        assert!(updated.last_taken.is_none());
    }

    #[test]
    fn delete_absent_id_leaves_blob_unchanged() {
        let kv = test_store();
        add_medication(&kv, losartan()).unwrap();
        let before = kv.get(StorageKey::Medications).unwrap().unwrap();

        delete_medication(&kv, "does-not-exist").unwrap();

        let after = kv.get(StorageKey::Medications).unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn save_list_round_trips() {
        let kv = test_store();
        let a = add_medication(&kv, losartan()).unwrap();
        let mut b = a.clone();
        b.id = "2".into();
        b.name = "Metformina".into();
        b.status = MedicationStatus::Overdue;
        b.extra.insert("color".into(), serde_json::json!("#E53935"));

        let list = vec![b, a];
        save_medication_list(&kv, &list).unwrap();
        assert_eq!(get_medications(&kv), list);
    }
}
