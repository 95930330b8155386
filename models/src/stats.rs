// models/src/stats.rs
use serde::{Deserialize, Serialize};

/// Ward-wide summary of one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    pub patient_count: usize,
    pub stable_count: usize,
    pub warning_count: usize,
    pub critical_count: usize,
    pub avg_heart_rate: f64,
    pub avg_spo2: f64,
    pub avg_temperature: f64,
}
