//! Input-time checks for the medication and blood-pressure forms.
//!
//! The store itself never validates; callers run these before `add_*`.
//! Messages are user-facing Spanish strings keyed by form field.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{NewBloodPressure, NewMedication};

pub const SYSTOLIC_RANGE: std::ops::RangeInclusive<i32> = 50..=300;
pub const DIASTOLIC_RANGE: std::ops::RangeInclusive<i32> = 30..=200;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: BTreeMap<&'static str, &'static str>,
}

impl ValidationResult {
    fn from_errors(errors: BTreeMap<&'static str, &'static str>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn error(&self, field: &str) -> Option<&'static str> {
        self.errors.get(field).copied()
    }
}

pub fn validate_medication_input(input: &NewMedication) -> ValidationResult {
    let mut errors = BTreeMap::new();
    if input.name.trim().is_empty() {
        errors.insert("name", "El nombre del medicamento es requerido");
    }
    if input.dosage.trim().is_empty() {
        errors.insert("dosage", "La dosis es requerida");
    }
    if input.schedule.trim().is_empty() {
        errors.insert("schedule", "El horario es requerido");
    }
    ValidationResult::from_errors(errors)
}

/// Range checks per value, then systolic must exceed diastolic.
/// A zero reading counts as missing.
pub fn validate_blood_pressure_input(input: &NewBloodPressure) -> ValidationResult {
    let mut errors = BTreeMap::new();
    let (systolic, diastolic) = (input.systolic, input.diastolic);

    if systolic == 0 {
        errors.insert("systolic", "La presión sistólica es requerida");
    } else if !SYSTOLIC_RANGE.contains(&systolic) {
        errors.insert("systolic", "La presión sistólica debe estar entre 50 y 300 mmHg");
    }

    if diastolic == 0 {
        errors.insert("diastolic", "La presión diastólica es requerida");
    } else if !DIASTOLIC_RANGE.contains(&diastolic) {
        errors.insert("diastolic", "La presión diastólica debe estar entre 30 y 200 mmHg");
    }

    if systolic != 0 && diastolic != 0 && systolic <= diastolic {
        errors.insert("systolic", "La presión sistólica debe ser mayor que la diastólica");
    }

    ValidationResult::from_errors(errors)
}
