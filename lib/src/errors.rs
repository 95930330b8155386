// lib/src/errors.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Configuration error: patient count must be at least 1, got {0}")]
    InvalidPatientCount(usize),

    #[error("Configuration error: tick period must be at least 1 ms, got {0}")]
    InvalidTickPeriod(u64),

    #[error("Configuration error: {0} pool is empty")]
    EmptyPool(&'static str),

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Configuration source error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Not Found: patient {0}")]
    PatientNotFound(String),

    #[error("Non-finite {channel} value in reading: {value}")]
    NonFiniteReading { channel: &'static str, value: f64 },

    #[error("Snapshot sink failed: {0}")]
    Sink(String),
}

impl SimulationError {
    /// Errors that must abort startup.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SimulationError::InvalidPatientCount(_)
                | SimulationError::InvalidTickPeriod(_)
                | SimulationError::EmptyPool(_)
                | SimulationError::InvalidConfig(_)
                | SimulationError::Config(_)
        )
    }
}

pub type SimulationResult<T> = std::result::Result<T, SimulationError>;
