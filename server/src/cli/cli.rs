// server/src/cli/cli.rs

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;

use lib::config::{load_app_config, ConfigOverrides};
use lib::errors::SimulationError;
use lib::registry::{CensusPools, PatientRegistry};
use lib::simulator::Simulator;
use rest_api::{start_server, BroadcastGateway};

// CLI entry point for the vital-sign simulator
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "medlens-server")]
#[command(version = "0.1.0")]
#[command(about = "Simulated bedside monitor streaming patient vital signs")]
pub struct CliArgs {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, value_name = "FILE", env = "MEDLENS_CONFIG")]
    pub config: Option<PathBuf>,
    /// Number of simulated patients
    #[arg(long = "patients", value_name = "COUNT")]
    pub patients: Option<usize>,
    /// Tick period in milliseconds
    #[arg(long = "interval-ms", value_name = "MILLIS")]
    pub interval_ms: Option<u64>,
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<u16>,
    /// Allowed browser origin, or `*`
    #[arg(long = "cors-origin", value_name = "ORIGIN")]
    pub cors_origin: Option<String>,
}

impl CliArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            patient_count: self.patients,
            tick_period_ms: self.interval_ms,
            host: self.host.clone(),
            port: self.port,
            cors_origin: self.cors_origin.clone(),
        }
    }
}

/// Exit status for invalid configuration.
pub const EXIT_CONFIG: i32 = 2;
/// Exit status for any other startup or runtime failure.
pub const EXIT_FAILURE: i32 = 1;

/// Maps a failed run to a process exit status.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    let configuration = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<SimulationError>())
        .any(SimulationError::is_configuration);
    if configuration { EXIT_CONFIG } else { EXIT_FAILURE }
}

pub async fn start_cli() -> Result<()> {
    run(CliArgs::parse()).await
}

/// Loads configuration, admits the census, starts the simulator and serves
/// the gateway until Ctrl-C.
pub async fn run(args: CliArgs) -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }

    let config = load_app_config(args.config.as_deref(), |key| std::env::var(key).ok(), &args.overrides())
        .context("Failed to load configuration")?;

    let registry = PatientRegistry::create_all(
        config.simulation.patient_count,
        &CensusPools::default(),
        &mut rand::thread_rng(),
        Utc::now(),
    )
    .context("Failed to admit patients")?;
    let registry = Arc::new(registry);

    let gateway = BroadcastGateway::new(Arc::clone(&registry), config.gateway.broadcast_capacity);
    let simulator = Simulator::from_config(Arc::clone(&registry), &config.simulation)
        .context("Failed to create simulator")?;
    simulator.start(Arc::new(gateway.clone()));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let gateway_config = config.gateway.clone();
    let mut server = tokio::spawn(async move { start_server(&gateway_config, gateway, shutdown_rx).await });

    tokio::select! {
        result = &mut server => {
            simulator.shutdown().await;
            return result.context("Gateway task panicked")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("Shutting down gracefully...");
        }
    }

    simulator.shutdown().await;
    if shutdown_tx.send(()).is_err() {
        warn!("Gateway already stopped");
    }
    server.await.context("Gateway task panicked")??;
    info!("Server closed");
    Ok(())
}
