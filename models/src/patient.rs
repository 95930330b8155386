// models/src/patient.rs
use serde::{Deserialize, Serialize};

use crate::vitals::{ClinicalStatus, VitalReading};

/// Descriptive fields fixed when the patient is admitted to the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub ward: String,
    pub diagnosis: String,
}

/// Flat public view of one patient, as handed to snapshot consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub ward: String,
    pub diagnosis: String,
    pub vital_signs: VitalReading,
    pub status: ClinicalStatus,
}

impl PatientRecord {
    pub fn new(profile: &PatientProfile, vital_signs: VitalReading, status: ClinicalStatus) -> Self {
        PatientRecord {
            id: profile.id.clone(),
            name: profile.name.clone(),
            age: profile.age,
            ward: profile.ward.clone(),
            diagnosis: profile.diagnosis.clone(),
            vital_signs,
            status,
        }
    }
}
