use chrono::Utc;

use super::{delete_record, get_collection, insert_record, save_collection, update_record, InsertAt};
use crate::db::{KvStore, StoreError};
use crate::models::{DeliveryDate, DeliveryPatch, DeliveryStatus, NewDelivery};

/// Scheduled pick-ups in insertion order. Never fails.
pub fn get_delivery_dates(kv: &KvStore) -> Vec<DeliveryDate> {
    get_collection(kv)
}

pub fn save_delivery_list(kv: &KvStore, deliveries: &[DeliveryDate]) -> Result<(), StoreError> {
    save_collection(kv, deliveries)
}

/// Append a delivery; status defaults to `scheduled`.
pub fn add_delivery(kv: &KvStore, input: NewDelivery) -> Result<DeliveryDate, StoreError> {
    let NewDelivery {
        id,
        medication,
        date,
        time,
        location,
        address,
        status,
        notes,
        created_at,
    } = input;

    let delivery = insert_record(kv, id, InsertAt::Back, |id| DeliveryDate {
        id,
        medication,
        date,
        time,
        location,
        address,
        status: status.unwrap_or(DeliveryStatus::Scheduled),
        notes,
        created_at: created_at.unwrap_or_else(Utc::now),
        extra: Default::default(),
    })?;
    tracing::info!(id = %delivery.id, date = %delivery.date, "Delivery scheduled");
    Ok(delivery)
}

pub fn update_delivery(
    kv: &KvStore,
    id: &str,
    patch: DeliveryPatch,
) -> Result<DeliveryDate, StoreError> {
    update_record(kv, id, |d: &mut DeliveryDate| {
        patch.apply(d);
        Ok(())
    })
}

pub fn delete_delivery(kv: &KvStore, id: &str) -> Result<(), StoreError> {
    delete_record::<DeliveryDate>(kv, id)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::repository::test_support::test_store;

    fn pickup(medication: &str, day: u32) -> NewDelivery {
        NewDelivery {
            id: None,
            medication: medication.into(),
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            time: "09:00".into(),
            location: "Dispensario Principal - Coosalud".into(),
            address: Some("Carrera 15 #93-47, Bogotá".into()),
            status: None,
            notes: None,
            created_at: None,
        }
    }

    #[test]
    fn add_defaults_to_scheduled() {
        let kv = test_store();
        let d = add_delivery(&kv, pickup("Losartán", 15)).unwrap();
        assert_eq!(d.status, DeliveryStatus::Scheduled);
        assert_eq!(get_delivery_dates(&kv), vec![d]);
    }

    #[test]
    fn save_list_round_trips() {
        let kv = test_store();
        let first = add_delivery(&kv, pickup("Losartán", 15)).unwrap();
        let mut second = add_delivery(&kv, pickup("Metformina", 3)).unwrap();
        second.extra.insert("pharmacyCode".into(), serde_json::json!("A1"));

        let list = vec![second, first];
        save_delivery_list(&kv, &list).unwrap();
        assert_eq!(get_delivery_dates(&kv), list);
        assert_eq!(get_delivery_dates(&kv)[0].extra["pharmacyCode"], "A1");
    }

    #[test]
    fn insertion_order_is_kept() {
        let kv = test_store();
        let late = add_delivery(&kv, pickup("Metformina", 20)).unwrap();
        let early = add_delivery(&kv, pickup("Amlodipino", 10)).unwrap();
        let ids: Vec<_> = get_delivery_dates(&kv).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![late.id, early.id]);
    }

    #[test]
    fn update_marks_completed() {
        let kv = test_store();
        let d = add_delivery(&kv, pickup("Losartán", 15)).unwrap();
        let updated = update_delivery(
            &kv,
            &d.id,
            DeliveryPatch {
                status: Some(DeliveryStatus::Completed),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.status, DeliveryStatus::Completed);
        assert_eq!(updated.location, d.location);
    }

    #[test]
    fn update_missing_is_not_found() {
        let kv = test_store();
        let result = update_delivery(&kv, "x", DeliveryPatch::default());
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert!(get_delivery_dates(&kv).is_empty());
    }

    #[test]
    fn delete_removes_only_target() {
        let kv = test_store();
        let a = add_delivery(&kv, pickup("A", 1)).unwrap();
        let b = add_delivery(&kv, pickup("B", 2)).unwrap();
        delete_delivery(&kv, &a.id).unwrap();
        assert_eq!(get_delivery_dates(&kv), vec![b]);
    }
}
