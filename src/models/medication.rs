use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::enums::MedicationStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    /// Comma-separated times of day, e.g. "08:00,20:00".
    pub schedule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default)]
    pub next_delivery: Option<NaiveDate>,
    pub status: MedicationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_taken: Option<DateTime<Utc>>,
    /// Fields written by other clients, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Medication {
    /// Individual times parsed out of `schedule`, blanks dropped.
    pub fn schedule_times(&self) -> Vec<&str> {
        self.schedule
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Input for `add_medication`. `id`/`created_at` are assigned when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedication {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub dosage: String,
    pub schedule: String,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub next_delivery: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Partial update. `None` keeps the stored value, `Some` replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationPatch {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub schedule: Option<String>,
    pub frequency: Option<Option<String>>,
    pub instructions: Option<Option<String>>,
    pub next_delivery: Option<Option<NaiveDate>>,
    pub status: Option<MedicationStatus>,
    pub last_taken: Option<Option<DateTime<Utc>>>,
}

impl MedicationPatch {
    pub fn status(status: MedicationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Copy every `Some` field onto `med`. Status is assigned as-is; the
    /// repository checks the transition before calling this.
    pub fn apply(self, med: &mut Medication) {
        if let Some(v) = self.name {
            med.name = v;
        }
        if let Some(v) = self.dosage {
            med.dosage = v;
        }
        if let Some(v) = self.schedule {
            med.schedule = v;
        }
        if let Some(v) = self.frequency {
            med.frequency = v;
        }
        if let Some(v) = self.instructions {
            med.instructions = v;
        }
        if let Some(v) = self.next_delivery {
            med.next_delivery = v;
        }
        if let Some(v) = self.status {
            med.status = v;
        }
        if let Some(v) = self.last_taken {
            med.last_taken = v;
        }
    }
}
