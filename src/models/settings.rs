use serde::{Deserialize, Serialize};

/// App-wide preferences. Fields missing from a stored blob take their
/// default, so older blobs keep loading as new toggles are added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub notifications: bool,
    pub dark_mode: bool,
    pub premium: bool,
    pub language: String,
    /// Daily reminder time, "HH:MM".
    pub reminder_time: String,
    pub blood_pressure_reminders: bool,
    pub delivery_reminders: bool,
    pub motivational_messages: bool,
    pub sound_enabled: bool,
    pub vibration_enabled: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            notifications: true,
            dark_mode: false,
            premium: false,
            language: "es".into(),
            reminder_time: "08:00".into(),
            blood_pressure_reminders: true,
            delivery_reminders: true,
            motivational_messages: true,
            sound_enabled: true,
            vibration_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub notifications: Option<bool>,
    pub dark_mode: Option<bool>,
    pub premium: Option<bool>,
    pub language: Option<String>,
    pub reminder_time: Option<String>,
    pub blood_pressure_reminders: Option<bool>,
    pub delivery_reminders: Option<bool>,
    pub motivational_messages: Option<bool>,
    pub sound_enabled: Option<bool>,
    pub vibration_enabled: Option<bool>,
}

impl SettingsPatch {
    pub fn apply(self, s: &mut AppSettings) {
        macro_rules! take {
            ($($field:ident),+) => {
                $(if let Some(v) = self.$field { s.$field = v; })+
            };
        }
        take!(
            notifications,
            dark_mode,
            premium,
            language,
            reminder_time,
            blood_pressure_reminders,
            delivery_reminders,
            motivational_messages,
            sound_enabled,
            vibration_enabled
        );
    }
}
