// lib/src/config/config_structs.rs

use config::{Config, File};
use log::debug;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::config::config_defaults::*;
use crate::errors::{SimulationError, SimulationResult};

/// Knobs consumed by the simulation core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_patient_count")]
    pub patient_count: usize,
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            patient_count: DEFAULT_PATIENT_COUNT,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
        }
    }
}

impl SimulationConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn validate(&self) -> SimulationResult<()> {
        if self.patient_count == 0 {
            return Err(SimulationError::InvalidPatientCount(self.patient_count));
        }
        if self.tick_period_ms == 0 {
            return Err(SimulationError::InvalidTickPeriod(self.tick_period_ms));
        }
        Ok(())
    }
}

/// Network surface of the broadcast gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            host: default_host(),
            port: DEFAULT_PORT,
            cors_origin: default_cors_origin(),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl GatewayConfig {
    pub fn socket_addr(&self) -> SimulationResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| SimulationError::InvalidConfig(format!("invalid bind address {}:{}: {}", self.host, self.port, e)))
    }

    pub fn validate(&self) -> SimulationResult<()> {
        if self.broadcast_capacity == 0 {
            return Err(SimulationError::InvalidConfig("broadcast capacity must be at least 1".to_string()));
        }
        self.socket_addr().map(|_| ())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl AppConfig {
    pub fn validate(&self) -> SimulationResult<()> {
        self.simulation.validate()?;
        self.gateway.validate()
    }
}

/// Highest-precedence values, typically taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub patient_count: Option<usize>,
    pub tick_period_ms: Option<u64>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_origin: Option<String>,
}

/// Builds the application configuration from defaults, an optional file, the
/// environment (looked up through `env`) and explicit overrides, in that
/// order of precedence, then validates it.
pub fn load_app_config<F>(
    config_file: Option<&Path>,
    env: F,
    overrides: &ConfigOverrides,
) -> SimulationResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder()
        .set_default("simulation.patient_count", DEFAULT_PATIENT_COUNT as i64)?
        .set_default("simulation.tick_period_ms", DEFAULT_TICK_PERIOD_MS as i64)?
        .set_default("gateway.host", DEFAULT_HOST)?
        .set_default("gateway.port", DEFAULT_PORT as i64)?
        .set_default("gateway.cors_origin", DEFAULT_CORS_ORIGIN)?
        .set_default("gateway.broadcast_capacity", DEFAULT_BROADCAST_CAPACITY as i64)?;

    if let Some(path) = config_file {
        debug!("Loading configuration file {}", path.display());
        builder = builder.add_source(File::from(path).required(true));
    }

    let env_keys = [
        ("simulation.patient_count", ENV_PATIENT_COUNT),
        ("simulation.tick_period_ms", ENV_UPDATE_INTERVAL),
        ("gateway.host", ENV_HOST),
        ("gateway.port", ENV_PORT),
        ("gateway.cors_origin", ENV_CORS_ORIGIN),
    ];
    for (key, var) in env_keys {
        builder = builder.set_override_option(key, env(var))?;
    }

    builder = builder
        .set_override_option("simulation.patient_count", overrides.patient_count.map(|v| v as i64))?
        .set_override_option("simulation.tick_period_ms", overrides.tick_period_ms.map(|v| v as i64))?
        .set_override_option("gateway.host", overrides.host.clone())?
        .set_override_option("gateway.port", overrides.port.map(i64::from))?
        .set_override_option("gateway.cors_origin", overrides.cors_origin.clone())?;

    let app_config: AppConfig = builder.build()?.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}
