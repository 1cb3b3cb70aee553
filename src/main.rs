//! Tile Archive Server - serves MBTiles and PMTiles archives over HTTP.
//!
//! This binary parses the configuration, sets up logging and starts the server.

use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tile_archive_server::{
    config::Config,
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    if let Err(e) = init_logging(&config) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let server_config = match config.server_config() {
        Ok(server_config) => server_config,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Configuration:");
    match server_config.sandbox().file_name() {
        Some(name) => info!(
            "  Serving file: {}",
            server_config.sandbox().root().join(name).display()
        ),
        None => info!(
            "  Serving directory: {}",
            server_config.sandbox().root().display()
        ),
    }
    if server_config.auth_secret().is_some() {
        info!("  Auth: Basic authentication enabled");
    } else {
        warn!("  Auth: DISABLED - all archives are publicly accessible");
    }

    let router_config = RouterConfig::new().with_tracing(!config.no_tracing);
    let router = create_router(server_config, router_config);

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            eprintln!("Error: failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Serving Maps on http://{}{}", addr, config.web_path);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server failed: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
///
/// Nothing is installed unless logging was requested, so the server is
/// silent by default.
fn init_logging(config: &Config) -> std::io::Result<()> {
    if !config.logging_enabled() {
        return Ok(());
    }

    let default_filter = if config.verbose {
        "tile_archive_server=debug,tower_http=debug"
    } else {
        "tile_archive_server=info,tower_http=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match config.log_file.as_deref() {
        Some(path) => {
            let file = open_log_file(path)?;
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    OpenOptions::new().create(true).append(true).open(path)
}
