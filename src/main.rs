//! HTTP request-introspection service.
//!
//! Accepts any request on any path, logs its full shape and echoes it back
//! as JSON. `GET /errorcode/{code}` answers with the requested status code.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ listener ──▶ capture middleware ──▶ router
//!                                   │  extract snapshot      │
//!                                   │  (body read once)      ├─▶ echo responder (200)
//!                                   ▼                        └─▶ status-code responder
//!                               RequestLogger
//!                          (stdout or log file)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use request_echo::config::{load_config, validate_config, ConfigError, EchoConfig};
use request_echo::observability::{init_logging, metrics};
use request_echo::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "request-echo")]
#[command(about = "Echo any HTTP request back as JSON", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override observability.log_level.
    #[arg(long)]
    log_level: Option<String>,

    /// Override observability.log_file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn load(self) -> Result<EchoConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => EchoConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(file) = self.log_file {
            config.observability.log_file = Some(file);
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().load()?;

    init_logging(&config.observability)?;

    tracing::info!("request-echo v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.limits.max_body_size,
        log_requests = config.observability.log_requests,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
