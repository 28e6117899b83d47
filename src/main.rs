//! Sticky HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────────┐
//!                        │                  STICKY BALANCER                     │
//!                        │                                                      │
//!     Client Request     │  ┌─────────┐   ┌──────────┐   ┌──────────────┐       │
//!     ───────────────────┼─▶│  http   │──▶│ routing  │──▶│load_balancer │       │
//!                        │  │ server  │   │ identity │   │  selector    │       │
//!                        │  └─────────┘   └──────────┘   └──────┬───────┘       │
//!                        │                                      │ reads         │
//!                        │                               ┌──────▼───────┐       │
//!                        │                               │   live set   │◀──┐   │
//!                        │                               └──────┬───────┘   │   │
//!                        │                                      ▼           │   │
//!     Client Response    │  ┌─────────┐                  ┌──────────────┐   │   │
//!     ◀──────────────────┼──│ relayed │◀─────────────────│   forward    │◀──┼───┼── Backend
//!                        │  │response │                  └──────────────┘   │   │
//!                        │  └─────────┘                                     │   │
//!                        │                        ┌────────────────┐ writes │   │
//!                        │                        │ health monitor │────────┘   │
//!                        │                        │ (probe / tick) │◀───────────┼── GET /health
//!                        │                        └────────────────┘            │
//!                        └──────────────────────────────────────────────────────┘
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use sticky_balancer::config::{load_config, validate_config, BalancerConfig, ConfigError};
use sticky_balancer::lifecycle::signals::spawn_signal_listener;
use sticky_balancer::lifecycle::{Balancer, Shutdown};
use sticky_balancer::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "sticky-balancer")]
#[command(about = "HTTP load balancer with health checks and per-client stickiness", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load balancer port
    #[arg(long)]
    port: Option<u16>,

    /// Request timeout time in seconds
    #[arg(long = "timeout-sec")]
    timeout_sec: Option<u64>,

    /// Whether backends support HTTPS
    #[arg(long)]
    https: bool,

    /// Whether to include tracing information into responses
    #[arg(long)]
    trace: bool,

    /// Backend address; repeat to list several (replaces the configured list)
    #[arg(long = "backend", value_name = "HOST:PORT")]
    backends: Vec<String>,
}

impl Cli {
    /// Configuration from the file (or defaults), with flags applied on top.
    fn into_config(self) -> Result<BalancerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => BalancerConfig::default(),
        };

        if let Some(port) = self.port {
            let ip = config
                .listener
                .bind_address
                .parse::<SocketAddr>()
                .map(|addr| addr.ip())
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
            config.listener.bind_address = SocketAddr::new(ip, port).to_string();
        }
        if let Some(secs) = self.timeout_sec {
            config.upstream.timeout_ms = secs.saturating_mul(1000);
        }
        if self.https {
            config.upstream.https = true;
        }
        if self.trace {
            config.observability.trace_headers = true;
        }
        if !self.backends.is_empty() {
            config.backends = self.backends;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability.log_level)?;

    tracing::info!("sticky-balancer v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = ?config.backends,
        timeout_ms = config.upstream.timeout_ms,
        https = config.upstream.https,
        "Configuration loaded"
    );
    tracing::info!(
        enabled = config.observability.trace_headers,
        header = %config.observability.trace_header,
        "Tracing support"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let balancer = Balancer::build(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_listener(shutdown.clone());

    balancer.run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
