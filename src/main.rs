//! SSN validation service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ timeout ─▶ body limit
//!                                                          │
//!                                                          ▼
//!                                               ┌──────────────────┐   429
//!                                               │   rate limiter   │─────────▶
//!                                               │ (per peer IP)    │
//!                                               └────────┬─────────┘
//!                                                        ▼
//!                                               ┌──────────────────┐
//!                                               │ sanitize → SSN   │   200 / 400
//!                                               │ validator        │─────────▶
//!                                               └──────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use ssn_validation_service::config::loader::apply_env_overrides;
use ssn_validation_service::config::validation::validate_config;
use ssn_validation_service::config::{load_config, ConfigError, ServiceConfig};
use ssn_validation_service::lifecycle::{signals, Shutdown};
use ssn_validation_service::observability::{logging, metrics};
use ssn_validation_service::HttpServer;

#[derive(Parser)]
#[command(name = "ssn-validation-service")]
#[command(about = "HTTP service validating U.S. Social Security Numbers", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override rate_limit.requests_per_minute.
    #[arg(long)]
    requests_per_minute: Option<u32>,
}

fn resolve_config(args: &Args) -> Result<ServiceConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    apply_env_overrides(&mut config)?;

    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(limit) = args.requests_per_minute {
        config.rate_limit.requests_per_minute = limit;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    logging::init_logging(&config.observability);

    tracing::info!("ssn-validation-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        requests_per_minute = config.rate_limit.requests_per_minute,
        refill = ?config.rate_limit.refill,
        max_tracked_keys = config.rate_limit.max_tracked_keys,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    signals::forward_signals(&shutdown);

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
