use crate::db::StoreError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the JSON form.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = StoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(StoreError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(
    /// Dose state within the current schedule cycle.
    MedicationStatus {
        Pending => "pending",
        Taken => "taken",
        Overdue => "overdue",
    }
);

impl MedicationStatus {
    /// Allowed moves through the dose cycle. Overdue -> taken is not a plain
    /// status change; it goes through `mark_medication_taken`.
    pub fn can_transition_to(&self, next: MedicationStatus) -> bool {
        use MedicationStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (Taken, Taken)
                | (Overdue, Overdue)
                | (Pending, Taken)
                | (Pending, Overdue)
                | (Taken, Pending)
        )
    }
}

str_enum!(DeliveryStatus {
    Scheduled => "scheduled",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(
    /// Blood-pressure category shown to the patient (Spanish labels).
    BpCategory {
        Normal => "Normal",
        Prehypertension => "Prehipertensión",
        Hypertension => "Hipertensión",
    }
);

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn medication_status_round_trips_through_str() {
        for status in [
            MedicationStatus::Pending,
            MedicationStatus::Taken,
            MedicationStatus::Overdue,
        ] {
            assert_eq!(MedicationStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_invalid_enum() {
        let err = MedicationStatus::from_str("skipped").unwrap_err();
        assert!(matches!(err, StoreError::InvalidEnum { .. }));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&MedicationStatus::Overdue).unwrap();
        assert_eq!(json, "\"overdue\"");
    }

    #[test]
    fn category_serializes_spanish_label() {
        let json = serde_json::to_string(&BpCategory::Prehypertension).unwrap();
        assert_eq!(json, "\"Prehipertensión\"");
        let back: BpCategory = serde_json::from_str("\"Hipertensión\"").unwrap();
        assert_eq!(back, BpCategory::Hypertension);
    }

    #[test]
    fn allowed_transitions() {
        use MedicationStatus::*;
        assert!(Pending.can_transition_to(Taken));
        assert!(Pending.can_transition_to(Overdue));
        assert!(Taken.can_transition_to(Pending));
        assert!(Overdue.can_transition_to(Overdue));
    }

    #[test]
    fn forbidden_transitions() {
        use MedicationStatus::*;
        assert!(!Overdue.can_transition_to(Taken));
        assert!(!Overdue.can_transition_to(Pending));
        assert!(!Taken.can_transition_to(Overdue));
    }
}
