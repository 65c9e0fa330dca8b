//! Main application entry point (service binary).
//!
//! This is a thin wrapper around the `site_posture` library that handles:
//! - Environment variable loading (.env file)
//! - Command-line argument parsing
//! - Logger initialization
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use site_posture::initialization::{init_crypto_provider, init_logger_with};
use site_posture::{run_server, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // .env in the working directory, then next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    // Required before the first HTTPS fetch
    init_crypto_provider();

    if let Err(e) = run_server(config).await {
        eprintln!("site_posture error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}
