//! Adherence and blood-pressure summaries, and the shareable health report.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{BloodPressureMeasurement, DeliveryDate, Medication, MedicationStatus, UserProfile};

/// Readings considered for averages (the collection is newest-first).
pub const RECENT_READINGS: usize = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationStats {
    pub total: usize,
    pub taken: usize,
    pub pending: usize,
    pub overdue: usize,
    /// Whole percent of medications currently taken; 0 when there are none.
    pub adherence_rate: u32,
}

pub fn medication_stats(medications: &[Medication]) -> MedicationStats {
    let count = |status: MedicationStatus| medications.iter().filter(|m| m.status == status).count();
    let total = medications.len();
    let taken = count(MedicationStatus::Taken);
    MedicationStats {
        total,
        taken,
        pending: count(MedicationStatus::Pending),
        overdue: count(MedicationStatus::Overdue),
        adherence_rate: percent(taken, total),
    }
}

fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodPressureStats {
    pub avg_systolic: i32,
    pub avg_diastolic: i32,
    /// Over recent readings that recorded a pulse.
    pub avg_pulse: Option<i32>,
    pub total_measurements: usize,
    pub recent_measurements: usize,
}

/// Averages over the most recent readings. `None` for an empty history.
pub fn blood_pressure_stats(history: &[BloodPressureMeasurement]) -> Option<BloodPressureStats> {
    if history.is_empty() {
        return None;
    }
    let recent = &history[..history.len().min(RECENT_READINGS)];
    let pulses: Vec<i32> = recent.iter().filter_map(|m| m.pulse).collect();

    Some(BloodPressureStats {
        avg_systolic: rounded_mean(recent.iter().map(|m| m.systolic)),
        avg_diastolic: rounded_mean(recent.iter().map(|m| m.diastolic)),
        avg_pulse: (!pulses.is_empty()).then(|| rounded_mean(pulses.iter().copied())),
        total_measurements: history.len(),
        recent_measurements: recent.len(),
    })
}

fn rounded_mean(values: impl Iterator<Item = i32>) -> i32 {
    let (sum, n) = values.fold((0i64, 0i64), |(s, n), v| (s + i64::from(v), n + 1));
    if n == 0 {
        return 0;
    }
    (sum as f64 / n as f64).round() as i32
}

/// Whole calendar days from `today` to `date`; negative once it has passed.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

// ═══════════════════════════════════════════════════════════
// Health report
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub patient: Option<PatientSummary>,
    pub medications: MedicationReport,
    pub blood_pressure: Option<BloodPressureReport>,
    pub deliveries: DeliveryReport,
    pub report_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub name: String,
    pub age: Option<u32>,
    #[serde(rename = "eps")]
    pub insurance_provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationReport {
    pub total: usize,
    pub adherence: u32,
    pub list: Vec<MedicationLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationLine {
    pub name: String,
    pub dosage: String,
    pub status: MedicationStatus,
    pub last_taken: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodPressureReport {
    pub latest: BloodPressureMeasurement,
    pub average: BloodPressureStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Today or later.
    pub upcoming: usize,
    pub overdue: usize,
}

pub fn build_health_report(
    profile: Option<&UserProfile>,
    medications: &[Medication],
    history: &[BloodPressureMeasurement],
    deliveries: &[DeliveryDate],
    now: DateTime<Utc>,
) -> HealthReport {
    let today = now.date_naive();
    let upcoming = deliveries
        .iter()
        .filter(|d| days_until(d.date, today) >= 0)
        .count();

    let blood_pressure = match (history.first(), blood_pressure_stats(history)) {
        (Some(latest), Some(average)) => Some(BloodPressureReport {
            latest: latest.clone(),
            average,
        }),
        _ => None,
    };

    HealthReport {
        patient: profile.map(|p| PatientSummary {
            name: p.name.clone(),
            age: p.age,
            insurance_provider: p.insurance_provider.clone(),
        }),
        medications: MedicationReport {
            total: medications.len(),
            adherence: medication_stats(medications).adherence_rate,
            list: medications
                .iter()
                .map(|m| MedicationLine {
                    name: m.name.clone(),
                    dosage: m.dosage.clone(),
                    status: m.status,
                    last_taken: m.last_taken,
                })
                .collect(),
        },
        blood_pressure,
        deliveries: DeliveryReport {
            upcoming,
            overdue: deliveries.len() - upcoming,
        },
        report_date: now,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::Map;

    use super::*;
    use crate::models::{BpCategory, DeliveryStatus};

    fn med(status: MedicationStatus) -> Medication {
        Medication {
            id: format!("{status}"),
            name: "Losartán".into(),
            dosage: "50mg".into(),
            schedule: "08:00".into(),
            frequency: None,
            instructions: None,
            next_delivery: None,
            status,
            created_at: Utc::now(),
            last_taken: None,
            extra: Map::new(),
        }
    }

    fn bp(systolic: i32, diastolic: i32, pulse: Option<i32>) -> BloodPressureMeasurement {
        BloodPressureMeasurement {
            id: format!("{systolic}-{diastolic}"),
            systolic,
            diastolic,
            pulse,
            category: BpCategory::classify(systolic, diastolic),
            notes: None,
            created_at: Utc::now(),
            extra: Map::new(),
        }
    }

    fn delivery(date: NaiveDate) -> DeliveryDate {
        DeliveryDate {
            id: date.to_string(),
            medication: "Metformina".into(),
            date,
            time: "10:00".into(),
            location: "Dispensario".into(),
            address: None,
            status: DeliveryStatus::Scheduled,
            notes: None,
            created_at: Utc::now(),
            extra: Map::new(),
        }
    }

    #[test]
    fn adherence_rounds_to_whole_percent() {
        let meds = [
            med(MedicationStatus::Taken),
            med(MedicationStatus::Pending),
            med(MedicationStatus::Overdue),
        ];
        let stats = medication_stats(&meds);
        assert_eq!(stats.total, 3);
        assert_eq!((stats.taken, stats.pending, stats.overdue), (1, 1, 1));
        assert_eq!(stats.adherence_rate, 33);

        let two_of_three = [
            med(MedicationStatus::Taken),
            med(MedicationStatus::Taken),
            med(MedicationStatus::Pending),
        ];
        assert_eq!(medication_stats(&two_of_three).adherence_rate, 67);
    }

    #[test]
    fn no_medications_means_zero_adherence() {
        assert_eq!(medication_stats(&[]), MedicationStats::default());
    }

    #[test]
    fn bp_stats_use_seven_most_recent() {
        let mut history = vec![bp(130, 85, Some(72)); RECENT_READINGS];
        history.push(bp(200, 120, Some(110)));
        let stats = blood_pressure_stats(&history).unwrap();
        assert_eq!(stats.avg_systolic, 130);
        assert_eq!(stats.avg_diastolic, 85);
        assert_eq!(stats.avg_pulse, Some(72));
        assert_eq!(stats.total_measurements, 8);
        assert_eq!(stats.recent_measurements, 7);
    }

    #[test]
    fn pulse_average_skips_missing_pulses() {
        let history = [bp(120, 80, Some(70)), bp(124, 82, None), bp(122, 81, Some(75))];
        let stats = blood_pressure_stats(&history).unwrap();
        assert_eq!(stats.avg_systolic, 122);
        assert_eq!(stats.avg_pulse, Some(73));

        let no_pulse = blood_pressure_stats(&[bp(120, 80, None)]).unwrap();
        assert_eq!(no_pulse.avg_pulse, None);
    }

    #[test]
    fn empty_history_has_no_stats() {
        assert!(blood_pressure_stats(&[]).is_none());
    }

    #[test]
    fn days_until_counts_calendar_days() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        assert_eq!(days_until(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(), today), 5);
        assert_eq!(days_until(today, today), 0);
        assert_eq!(days_until(NaiveDate::from_ymd_opt(2024, 2, 9).unwrap(), today), -1);
    }

    #[test]
    fn health_report_aggregates_everything() {
        let now = Utc.with_ymd_and_hms(2024, 2, 10, 12, 0, 0).unwrap();
        let profile = UserProfile {
            name: "María García".into(),
            age: Some(65),
            insurance_provider: "Coosalud".into(),
            ..Default::default()
        };
        let meds = [med(MedicationStatus::Taken), med(MedicationStatus::Pending)];
        let history = [bp(142, 88, Some(80)), bp(118, 76, Some(70))];
        let deliveries = [
            delivery(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()),
            delivery(NaiveDate::from_ymd_opt(2024, 2, 20).unwrap()),
            delivery(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
        ];

        let report = build_health_report(Some(&profile), &meds, &history, &deliveries, now);
        let patient = report.patient.as_ref().unwrap();
        assert_eq!(patient.name, "María García");
        assert_eq!(report.medications.total, 2);
        assert_eq!(report.medications.adherence, 50);
        assert_eq!(report.medications.list.len(), 2);
        let bp_report = report.blood_pressure.as_ref().unwrap();
        assert_eq!(bp_report.latest.systolic, 142);
        assert_eq!(bp_report.average.avg_systolic, 130);
        assert_eq!(report.deliveries, DeliveryReport { upcoming: 2, overdue: 1 });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["patient"]["eps"], "Coosalud");
        assert_eq!(json["reportDate"], "2024-02-10T12:00:00Z");
    }

    #[test]
    fn report_without_profile_or_readings() {
        let report = build_health_report(None, &[], &[], &[], Utc::now());
        assert!(report.patient.is_none());
        assert!(report.blood_pressure.is_none());
        assert_eq!(report.medications.adherence, 0);
    }
}
