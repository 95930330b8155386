// server/src/cli/mod.rs

pub mod cli;

pub use cli::{exit_code, run, start_cli, CliArgs, EXIT_CONFIG, EXIT_FAILURE};
