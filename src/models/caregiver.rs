use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A family member or carer who receives the patient's alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caregiver {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub relationship: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub date_added: DateTime<Utc>,
    #[serde(default)]
    pub notifications: CaregiverNotifications,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which alert channels a caregiver is subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaregiverNotifications {
    pub medication_reminders: bool,
    pub delivery_reminders: bool,
    pub blood_pressure_alerts: bool,
}

impl Default for CaregiverNotifications {
    fn default() -> Self {
        Self {
            medication_reminders: true,
            delivery_reminders: true,
            blood_pressure_alerts: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCaregiver {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub phone: String,
    pub relationship: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notifications: Option<CaregiverNotifications>,
    #[serde(default)]
    pub date_added: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaregiverPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub relationship: Option<String>,
    pub email: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub notifications: Option<CaregiverNotifications>,
}

impl CaregiverPatch {
    pub fn apply(self, c: &mut Caregiver) {
        if let Some(v) = self.name {
            c.name = v;
        }
        if let Some(v) = self.phone {
            c.phone = v;
        }
        if let Some(v) = self.relationship {
            c.relationship = v;
        }
        if let Some(v) = self.email {
            c.email = v;
        }
        if let Some(v) = self.is_active {
            c.is_active = v;
        }
        if let Some(v) = self.notifications {
            c.notifications = v;
        }
    }
}
