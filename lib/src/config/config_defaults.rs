// lib/src/config/config_defaults.rs

// --- Constants ---
pub const DEFAULT_PATIENT_COUNT: usize = 20;
pub const DEFAULT_TICK_PERIOD_MS: u64 = 1000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_BROADCAST_CAPACITY: usize = 64;

// Legacy flat environment variable names understood by the dashboard deployment.
pub const ENV_PATIENT_COUNT: &str = "PATIENT_COUNT";
pub const ENV_UPDATE_INTERVAL: &str = "UPDATE_INTERVAL";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_CORS_ORIGIN: &str = "CORS_ORIGIN";

pub fn default_patient_count() -> usize { DEFAULT_PATIENT_COUNT }
pub fn default_tick_period_ms() -> u64 { DEFAULT_TICK_PERIOD_MS }
pub fn default_host() -> String { DEFAULT_HOST.to_string() }
pub fn default_port() -> u16 { DEFAULT_PORT }
pub fn default_cors_origin() -> String { DEFAULT_CORS_ORIGIN.to_string() }
pub fn default_broadcast_capacity() -> usize { DEFAULT_BROADCAST_CAPACITY }
