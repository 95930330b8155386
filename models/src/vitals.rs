// models/src/vitals.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One set of vital-sign measurements taken at `captured_at`.
///
/// Readings are replaced wholesale on every tick, never edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalReading {
    pub heart_rate: f64,
    pub systolic: f64,
    pub diastolic: f64,
    pub spo2: f64,
    pub temperature: f64,
    pub respiratory_rate: f64,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClinicalStatus {
    Stable,
    Warning,
    Critical,
}

impl ClinicalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClinicalStatus::Stable => "stable",
            ClinicalStatus::Warning => "warning",
            ClinicalStatus::Critical => "critical",
        }
    }
}

impl fmt::Display for ClinicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
