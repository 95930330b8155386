// server/src/main.rs

// Entry point for the vital-sign simulator server.

use log::error;
use medlens_server::cli::{exit_code, start_cli};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = start_cli().await {
        error!("{:#}", e);
        std::process::exit(exit_code(&e));
    }
}
