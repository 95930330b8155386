// lib/src/lib.rs

//! Simulation core for the bedside monitor.
//!
//! A [`registry::PatientRegistry`] owns the simulated census, the
//! [`simulator::Simulator`] evolves every patient's vitals on a fixed tick and
//! hands the full snapshot to a [`simulator::SnapshotSink`].

pub mod config;
pub mod errors;
pub mod registry;
pub mod simulator;
pub mod stats;
pub mod vitals;

pub use crate::config::{AppConfig, GatewayConfig, SimulationConfig};
pub use crate::errors::*;
pub use crate::registry::{CensusPools, PatientRegistry};
pub use crate::simulator::{BoundedRandomWalk, Simulator, SimulatorState, SnapshotSink, TickReport, VitalModel};

pub use models::{ClinicalStatus, PatientProfile, PatientRecord, SnapshotStats, VitalReading};
