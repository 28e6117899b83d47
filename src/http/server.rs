//! HTTP server setup and the per-request frontend.
//!
//! # Responsibilities
//! - Create the Axum Router that accepts any method and path
//! - Wire up middleware (tracing)
//! - Bind server to listener, stop on shutdown
//! - Run the frontend pipeline for each request
//!
//! # Request pipeline
//! ```text
//! ReceivedRequest → IdentityDerived → BackendSelected → Forwarding → Completed
//!                                   ↘ Failed(Unavailable)         ↘ Failed(ForwardFailure)
//! ```
//! Each step runs once; there is no retry and no re-selection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::http::forward::RequestForwarder;
use crate::http::response::{service_unavailable, RequestOutcome};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::load_balancer::live_set::LiveSetReader;
use crate::load_balancer::selector::{select, RoutingDecision};
use crate::observability::metrics;
use crate::resilience::timeouts::Deadline;
use crate::routing::identity::IdentityChain;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub live: LiveSetReader,
    pub identity: Arc<IdentityChain>,
    pub forwarder: Arc<RequestForwarder>,
    /// Total budget for one request's outbound work.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(live: LiveSetReader, forwarder: RequestForwarder, request_timeout: Duration) -> Self {
        Self {
            live,
            identity: Arc::new(IdentityChain::default()),
            forwarder: Arc::new(forwarder),
            request_timeout,
        }
    }
}

/// HTTP frontend for the balancer.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(frontend_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.recv().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// The frontend: derive identity, select a backend, forward.
async fn frontend_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let deadline = Deadline::after(state.request_timeout);

    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identity = state.identity.derive(request.headers(), remote);

    // One snapshot per request; the decision never mixes generations.
    let live = state.live.snapshot();
    let backend = match select(&identity, &live) {
        RoutingDecision::Backend(backend) => backend,
        RoutingDecision::Unavailable => {
            tracing::warn!(
                client = %identity,
                generation = live.generation(),
                "Error selecting server: no healthy servers available"
            );
            metrics::record_request(RequestOutcome::Unavailable.as_str(), start_time);
            return service_unavailable();
        }
    };

    tracing::debug!(
        client = %identity,
        backend = %backend,
        generation = live.generation(),
        method = %request.method(),
        path = %request.uri().path(),
        "Client routed"
    );

    match state.forwarder.forward(&backend, request, deadline).await {
        Ok(response) => {
            metrics::record_request(RequestOutcome::Completed.as_str(), start_time);
            response
        }
        Err(e) => {
            tracing::error!(client = %identity, error = %e, "Forward failed");
            metrics::record_request(RequestOutcome::ForwardFailed.as_str(), start_time);
            service_unavailable()
        }
    }
}
