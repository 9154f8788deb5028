use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::enums::BpCategory;

/// A single blood-pressure reading. Collections are kept newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodPressureMeasurement {
    pub id: String,
    /// mmHg
    pub systolic: i32,
    /// mmHg
    pub diastolic: i32,
    #[serde(default)]
    pub pulse: Option<i32>,
    pub category: BpCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Capture time.
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBloodPressure {
    #[serde(default)]
    pub id: Option<String>,
    pub systolic: i32,
    pub diastolic: i32,
    #[serde(default)]
    pub pulse: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BloodPressurePatch {
    pub systolic: Option<i32>,
    pub diastolic: Option<i32>,
    pub pulse: Option<Option<i32>>,
    pub notes: Option<Option<String>>,
}

impl BloodPressurePatch {
    /// Apply and re-derive the category from the resulting values.
    pub fn apply(self, m: &mut BloodPressureMeasurement) {
        if let Some(v) = self.systolic {
            m.systolic = v;
        }
        if let Some(v) = self.diastolic {
            m.diastolic = v;
        }
        if let Some(v) = self.pulse {
            m.pulse = v;
        }
        if let Some(v) = self.notes {
            m.notes = v;
        }
        m.category = BpCategory::classify(m.systolic, m.diastolic);
    }
}

impl BpCategory {
    /// Normal: both below 120/80. Prehypertension: below 140/90.
    /// Anything else is hypertension.
    pub fn classify(systolic: i32, diastolic: i32) -> Self {
        if systolic < 120 && diastolic < 80 {
            BpCategory::Normal
        } else if systolic < 140 && diastolic < 90 {
            BpCategory::Prehypertension
        } else {
            BpCategory::Hypertension
        }
    }

    /// Display colour (hex).
    pub fn color(&self) -> &'static str {
        match self {
            BpCategory::Normal => "#4CAF50",
            BpCategory::Prehypertension => "#FF9800",
            BpCategory::Hypertension => "#E53935",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            BpCategory::Normal => "¡Excelente! Tu presión arterial está en el rango normal.",
            BpCategory::Prehypertension => "Tu presión está elevada. Consulta con tu médico.",
            BpCategory::Hypertension => {
                "Tu presión está alta. Consulta inmediatamente con tu médico."
            }
        }
    }

    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            BpCategory::Normal => &[
                "Mantén tu estilo de vida saludable",
                "Continúa con tu tratamiento médico",
                "Realiza controles regulares",
            ],
            BpCategory::Prehypertension => &[
                "Reduce el consumo de sal",
                "Aumenta la actividad física",
                "Mantén un peso saludable",
                "Evita el estrés",
            ],
            BpCategory::Hypertension => &[
                "Consulta con tu médico urgentemente",
                "Toma tus medicamentos según indicación",
                "Evita actividades que aumenten la presión",
                "Monitorea tu presión regularmente",
            ],
        }
    }
}
