//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Build the backend pool, outbound client, health monitor and HTTP server
//! - Start the monitor, serve until shutdown, then stop the monitor
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The server starts with an empty live set; requests get 503 until the
//!   first probes (fired immediately) report in

use axum::http::header::InvalidHeaderName;
use axum::http::HeaderName;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{validate_config, BalancerConfig, ConfigError};
use crate::health::monitor::HealthMonitor;
use crate::health::probe::LivenessProbe;
use crate::http::client::{forward_client, outbound_client};
use crate::http::forward::RequestForwarder;
use crate::http::server::{AppState, HttpServer};
use crate::lifecycle::shutdown::Shutdown;
use crate::load_balancer::backend::{BackendError, Scheme};
use crate::load_balancer::live_set::LiveSetReader;
use crate::load_balancer::pool::BackendPool;

/// Error type for bringing the balancer up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid backend address: {0}")]
    Backend(#[from] BackendError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid trace header: {0}")]
    TraceHeader(#[from] InvalidHeaderName),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully wired balancer, ready to run.
pub struct Balancer {
    monitor: HealthMonitor,
    server: HttpServer,
    live: LiveSetReader,
}

impl Balancer {
    /// Build every subsystem from a configuration.
    pub fn build(config: &BalancerConfig) -> Result<Self, StartupError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let scheme = Scheme::from_https(config.upstream.https);
        let pool = BackendPool::new(config.backends.iter().cloned(), scheme)?;
        let client = outbound_client()?;
        let timeout = config.upstream.timeout();

        let probe = LivenessProbe::new(client, config.health_check.path.clone(), timeout);
        let (monitor, live) = HealthMonitor::new(pool, probe, config.health_check.interval());

        let mut forwarder = RequestForwarder::new(forward_client(), timeout);
        if config.observability.trace_headers {
            let name = HeaderName::from_bytes(config.observability.trace_header.as_bytes())?;
            forwarder = forwarder.with_trace_header(name);
        }

        let server = HttpServer::new(AppState::new(live.clone(), forwarder, timeout));

        Ok(Self {
            monitor,
            server,
            live,
        })
    }

    /// Reader for the live set this balancer routes on.
    pub fn live_set(&self) -> LiveSetReader {
        self.live.clone()
    }

    /// Run until `shutdown` is triggered or the server fails.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), StartupError> {
        let monitor = self.monitor.spawn(shutdown);
        let served = self.server.run(listener, shutdown.subscribe()).await;

        // The server may have stopped on its own; the probe tasks must follow.
        if !shutdown.is_triggered() {
            tracing::warn!("HTTP server stopped without a shutdown request");
            shutdown.trigger();
        }
        monitor.join().await;

        served.map_err(StartupError::from)
    }
}
