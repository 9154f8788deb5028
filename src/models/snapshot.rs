use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AppSettings, BloodPressureMeasurement, Caregiver, DeliveryDate, Medication, UserProfile};

/// Everything on the device, as produced by `export_all`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    pub user_data: Option<UserProfile>,
    pub medications: Vec<Medication>,
    pub blood_pressure: Vec<BloodPressureMeasurement>,
    pub delivery_dates: Vec<DeliveryDate>,
    pub caregivers: Vec<Caregiver>,
    pub settings: AppSettings,
    pub export_date: DateTime<Utc>,
    pub app_version: String,
}

/// Payload exchanged with the remote mirror. A `None` collection is skipped
/// on push; pull always fills every collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorSnapshot {
    pub user_data: Option<UserProfile>,
    pub medications: Option<Vec<Medication>>,
    pub blood_pressure: Option<Vec<BloodPressureMeasurement>>,
    pub delivery_dates: Option<Vec<DeliveryDate>>,
    pub caregivers: Option<Vec<Caregiver>>,
}

impl From<ExportSnapshot> for MirrorSnapshot {
    fn from(export: ExportSnapshot) -> Self {
        Self {
            user_data: export.user_data,
            medications: Some(export.medications),
            blood_pressure: Some(export.blood_pressure),
            delivery_dates: Some(export.delivery_dates),
            caregivers: Some(export.caregivers),
        }
    }
}
