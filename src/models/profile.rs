use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The patient's own record. One per installation.
///
/// Every field is defaulted on read so that partial documents (for example a
/// remote user document that only carries login metadata) still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub name: String,
    pub age: Option<u32>,
    pub diagnosis: String,
    /// Health-insurance provider (EPS) identifier.
    #[serde(rename = "eps")]
    pub insurance_provider: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub address: String,
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfilePatch {
    pub name: Option<String>,
    pub age: Option<Option<u32>>,
    pub diagnosis: Option<String>,
    pub insurance_provider: Option<String>,
    pub phone: Option<String>,
    pub email: Option<Option<String>>,
    pub address: Option<String>,
    pub emergency_contact: Option<Option<EmergencyContact>>,
}

impl UserProfilePatch {
    pub fn apply(self, p: &mut UserProfile) {
        if let Some(v) = self.name {
            p.name = v;
        }
        if let Some(v) = self.age {
            p.age = v;
        }
        if let Some(v) = self.diagnosis {
            p.diagnosis = v;
        }
        if let Some(v) = self.insurance_provider {
            p.insurance_provider = v;
        }
        if let Some(v) = self.phone {
            p.phone = v;
        }
        if let Some(v) = self.email {
            p.email = v;
        }
        if let Some(v) = self.address {
            p.address = v;
        }
        if let Some(v) = self.emergency_contact {
            p.emergency_contact = v;
        }
    }
}
