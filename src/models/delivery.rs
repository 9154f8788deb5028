use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::enums::DeliveryStatus;

/// A scheduled medication pick-up at a dispensary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDate {
    pub id: String,
    /// Name of the medication being collected.
    pub medication: String,
    pub date: NaiveDate,
    /// "HH:MM"
    pub time: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDelivery {
    #[serde(default)]
    pub id: Option<String>,
    pub medication: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub status: Option<DeliveryStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryPatch {
    pub medication: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub address: Option<Option<String>>,
    pub status: Option<DeliveryStatus>,
    pub notes: Option<Option<String>>,
}

impl DeliveryPatch {
    pub fn apply(self, d: &mut DeliveryDate) {
        if let Some(v) = self.medication {
            d.medication = v;
        }
        if let Some(v) = self.date {
            d.date = v;
        }
        if let Some(v) = self.time {
            d.time = v;
        }
        if let Some(v) = self.location {
            d.location = v;
        }
        if let Some(v) = self.address {
            d.address = v;
        }
        if let Some(v) = self.status {
            d.status = v;
        }
        if let Some(v) = self.notes {
            d.notes = v;
        }
    }
}
