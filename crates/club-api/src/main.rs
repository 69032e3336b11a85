//! Club API Server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p club-api
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use club_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Tracing format depends on APP_ENV, so configuration comes first
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "Server failed to start");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        env = ?config.app.env,
        port = config.api.port,
        "Starting Club API Server..."
    );

    club_api::run(config).await?;

    Ok(())
}
