//! Liveness probing.
//!
//! # Responsibilities
//! - Issue one bounded-time `GET <health path>` against one backend
//! - Classify the outcome (served, timeout, bad status, transport error)
//!
//! # Design Decisions
//! - Only `200 OK` counts as live; any other status is a failure
//! - No retry inside a probe; one failed probe is definitive for that tick
//! - The response is dropped unread, releasing its connection

use std::future::Future;
use std::time::Duration;

use axum::http::header::USER_AGENT;
use axum::http::StatusCode;
use thiserror::Error;

use crate::load_balancer::backend::Backend;

const PROBE_USER_AGENT: &str = concat!("sticky-balancer-health-check/", env!("CARGO_PKG_VERSION"));

/// Why a liveness probe failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    #[error("timed out")]
    Timeout,

    #[error("non-200 status {0}")]
    Status(StatusCode),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ProbeFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeFailure::Timeout
        } else {
            ProbeFailure::Transport(err.to_string())
        }
    }
}

/// A single liveness check against one backend.
pub trait Probe: Send + Sync + 'static {
    fn check(&self, backend: &Backend) -> impl Future<Output = Result<(), ProbeFailure>> + Send;
}

/// HTTP liveness probe.
#[derive(Debug, Clone)]
pub struct LivenessProbe {
    client: reqwest::Client,
    path: String,
    timeout: Duration,
}

impl LivenessProbe {
    pub fn new(client: reqwest::Client, path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            path: path.into(),
            timeout,
        }
    }
}

impl Probe for LivenessProbe {
    async fn check(&self, backend: &Backend) -> Result<(), ProbeFailure> {
        let response = self
            .client
            .get(backend.url_for(&self.path))
            .header(USER_AGENT, PROBE_USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(ProbeFailure::Status(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::client::outbound_client;
    use crate::load_balancer::backend::Scheme;
    use axum::{routing::get, Router};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn probe(timeout_ms: u64) -> LivenessProbe {
        LivenessProbe::new(outbound_client().unwrap(), "/health", Duration::from_millis(timeout_ms))
    }

    fn backend(addr: SocketAddr) -> Backend {
        Backend::new(addr.to_string(), Scheme::Http).unwrap()
    }

    #[tokio::test]
    async fn test_ok_is_live() {
        let addr = serve(Router::new().route("/health", get(|| async { "ok" }))).await;
        assert_eq!(probe(1000).check(&backend(addr)).await, Ok(()));
    }

    #[tokio::test]
    async fn test_non_200_is_failure() {
        let addr = serve(
            Router::new()
                .route("/health", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
                .route("/empty", get(|| async { StatusCode::NO_CONTENT })),
        )
        .await;

        let result = probe(1000).check(&backend(addr)).await;
        assert_eq!(result, Err(ProbeFailure::Status(StatusCode::INTERNAL_SERVER_ERROR)));

        // 2xx other than 200 is still not "serving".
        let other_path = LivenessProbe::new(outbound_client().unwrap(), "/empty", Duration::from_secs(1));
        let result = other_path.check(&backend(addr)).await;
        assert_eq!(result, Err(ProbeFailure::Status(StatusCode::NO_CONTENT)));
    }

    #[tokio::test]
    async fn test_missing_route_is_failure() {
        let addr = serve(Router::new()).await;
        let result = probe(1000).check(&backend(addr)).await;
        assert_eq!(result, Err(ProbeFailure::Status(StatusCode::NOT_FOUND)));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let addr = serve(Router::new().route(
            "/health",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        ))
        .await;
        assert_eq!(probe(100).check(&backend(addr)).await, Err(ProbeFailure::Timeout));
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = probe(1000).check(&backend(addr)).await;
        assert!(matches!(result, Err(ProbeFailure::Transport(_))), "got {result:?}");
    }
}
