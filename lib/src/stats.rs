// lib/src/stats.rs

use models::{ClinicalStatus, PatientRecord, SnapshotStats};

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Status counts and rounded channel averages for one snapshot.
pub fn summarize(patients: &[PatientRecord]) -> SnapshotStats {
    if patients.is_empty() {
        return SnapshotStats::default();
    }

    let mut stats = SnapshotStats {
        patient_count: patients.len(),
        ..SnapshotStats::default()
    };
    let (mut heart_rate, mut spo2, mut temperature) = (0.0, 0.0, 0.0);
    for patient in patients {
        match patient.status {
            ClinicalStatus::Stable => stats.stable_count += 1,
            ClinicalStatus::Warning => stats.warning_count += 1,
            ClinicalStatus::Critical => stats.critical_count += 1,
        }
        heart_rate += patient.vital_signs.heart_rate;
        spo2 += patient.vital_signs.spo2;
        temperature += patient.vital_signs.temperature;
    }

    let n = patients.len() as f64;
    stats.avg_heart_rate = round_one_decimal(heart_rate / n);
    stats.avg_spo2 = round_one_decimal(spo2 / n);
    stats.avg_temperature = round_one_decimal(temperature / n);
    stats
}
