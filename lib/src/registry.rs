// lib/src/registry.rs

//! The fixed census of simulated patients.
//!
//! Profiles never change after creation. Each patient's `(reading, status)`
//! pair sits behind its own lock so a reader always sees a pair that was
//! written together.

use chrono::{DateTime, Utc};
use log::debug;
use rand::Rng;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::errors::{SimulationError, SimulationResult};
use crate::vitals;
use models::{ClinicalStatus, PatientProfile, PatientRecord, VitalReading};

pub const PATIENT_ID_PREFIX: &str = "PAT";

pub fn patient_id(sequence: usize) -> String {
    format!("{}{:04}", PATIENT_ID_PREFIX, sequence)
}

/// Value pools patient profiles are drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CensusPools {
    pub names: Vec<String>,
    pub wards: Vec<String>,
    pub diagnoses: Vec<String>,
}

impl Default for CensusPools {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        CensusPools {
            names: owned(&["Kim, J", "Lee, M", "Park, S", "Choi, K", "Jung, H", "Kang, Y", "Lim, J", "Han, D"]),
            wards: owned(&["ICU", "CCU", "일반병동 2A", "일반병동 3B"]),
            diagnoses: owned(&["Pneumonia", "Heart Failure", "Sepsis", "Post-operative", "Acute MI"]),
        }
    }
}

impl CensusPools {
    fn validate(&self) -> SimulationResult<()> {
        if self.names.is_empty() {
            return Err(SimulationError::EmptyPool("name"));
        }
        if self.wards.is_empty() {
            return Err(SimulationError::EmptyPool("ward"));
        }
        if self.diagnoses.is_empty() {
            return Err(SimulationError::EmptyPool("diagnosis"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct VitalState {
    reading: VitalReading,
    status: ClinicalStatus,
}

#[derive(Debug)]
struct PatientEntry {
    profile: PatientProfile,
    state: RwLock<VitalState>,
}

impl PatientEntry {
    fn state(&self) -> VitalState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self) -> PatientRecord {
        let state = self.state();
        PatientRecord::new(&self.profile, state.reading, state.status)
    }
}

#[derive(Debug)]
pub struct PatientRegistry {
    entries: Vec<PatientEntry>,
    index: HashMap<String, usize>,
}

impl PatientRegistry {
    /// Admits `count` patients `PAT0001..` with profiles drawn from `pools`
    /// and an initial reading captured at `captured_at`.
    pub fn create_all<R: Rng + ?Sized>(
        count: usize,
        pools: &CensusPools,
        rng: &mut R,
        captured_at: DateTime<Utc>,
    ) -> SimulationResult<Self> {
        if count == 0 {
            return Err(SimulationError::InvalidPatientCount(count));
        }
        pools.validate()?;

        let mut entries = Vec::with_capacity(count);
        let mut index = HashMap::with_capacity(count);
        for sequence in 1..=count {
            let profile = PatientProfile {
                id: patient_id(sequence),
                name: pools.names[sequence % pools.names.len()].clone(),
                age: rng.gen_range(55..90),
                ward: pools.wards[rng.gen_range(0..pools.wards.len())].clone(),
                diagnosis: pools.diagnoses[rng.gen_range(0..pools.diagnoses.len())].clone(),
            };
            let reading = vitals::initial_reading(rng, captured_at);
            let status = vitals::classify(&reading);
            debug!("Admitted patient {} to {} with status {}", profile.id, profile.ward, status);

            index.insert(profile.id.clone(), entries.len());
            entries.push(PatientEntry {
                profile,
                state: RwLock::new(VitalState { reading, status }),
            });
        }
        Ok(PatientRegistry { entries, index })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Patient ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.profile.id.as_str())
    }

    /// Every patient in creation order.
    pub fn all(&self) -> Vec<PatientRecord> {
        self.entries.iter().map(PatientEntry::record).collect()
    }

    pub fn by_id(&self, id: &str) -> Option<PatientRecord> {
        self.index.get(id).map(|&i| self.entries[i].record())
    }

    /// Current reading of one patient.
    pub fn reading(&self, id: &str) -> Option<VitalReading> {
        self.index.get(id).map(|&i| self.entries[i].state().reading)
    }

    /// Replaces a patient's reading and status as one unit.
    pub(crate) fn apply_update(&self, id: &str, reading: VitalReading, status: ClinicalStatus) -> SimulationResult<()> {
        let &i = self
            .index
            .get(id)
            .ok_or_else(|| SimulationError::PatientNotFound(id.to_string()))?;
        let mut state = self.entries[i].state.write().unwrap_or_else(PoisonError::into_inner);
        *state = VitalState { reading, status };
        Ok(())
    }

    /// Latest capture time across the census.
    pub fn latest_capture(&self) -> Option<DateTime<Utc>> {
        self.entries.iter().map(|e| e.state().reading.captured_at).max()
    }
}
