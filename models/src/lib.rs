// models/src/lib.rs

//! Shared data model for the patient monitor: vital readings, clinical
//! status, patient records and snapshot statistics. Field names on the wire
//! follow the dashboard contract (`vitalSigns`, `heartRate`, ...).

pub mod patient;
pub mod stats;
pub mod vitals;

pub use patient::{PatientProfile, PatientRecord};
pub use stats::SnapshotStats;
pub use vitals::{ClinicalStatus, VitalReading};
