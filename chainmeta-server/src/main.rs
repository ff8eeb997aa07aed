//! chainmeta HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p chainmeta-server --release
//!
//! # Run with custom config path
//! CONFIG=/path/to/config.toml cargo run -p chainmeta-server
//!
//! # Configure logging level
//! RUST_LOG=chainmeta=debug,info cargo run -p chainmeta-server
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `config.toml`)
//! - `HOST` - Override bind address (default: `0.0.0.0`)
//! - `PORT` - Override port (default: `3000`)
//! - `RUST_LOG` - Log level filter (default: `info`)
//!
//! A `.env` file in the working directory is loaded first.

mod util;

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::Method;
use clap::Parser;
use tower_http::cors;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use chainmeta_server::config::ServerConfig;
use chainmeta_server::{AppState, router};

use crate::util::SigDown;

#[derive(Parser, Debug)]
#[command(name = "chainmeta-server", version, about = "Contract, balance and token metadata API")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = dotenv
        && !e.not_found()
    {
        tracing::warn!("Failed to load .env: {e}");
    }

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("Server failed: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load_from(&args.config)?;
    tracing::info!(
        config = %args.config.display(),
        host = %config.host,
        port = config.port,
        timeout_secs = config.provider_timeout_secs,
        "Loaded configuration"
    );

    let state = AppState::from_config(&config)?;

    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers(cors::Any),
        );

    let sig_down = SigDown::try_new()?;
    let token = sig_down.cancellation_token();

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;

    sig_down.recv().await;
    tracing::info!("Shut down gracefully");
    Ok(())
}
