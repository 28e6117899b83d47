//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use sticky_balancer::config::BalancerConfig;
use sticky_balancer::lifecycle::{Balancer, Shutdown, StartupError};
use sticky_balancer::load_balancer::LiveSetReader;

/// A programmable backend: answers `/health` while healthy and names itself
/// on every other path.
#[derive(Clone)]
pub struct MockBackend {
    pub name: &'static str,
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    healthy: Arc<AtomicBool>,
}

impl MockBackend {
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// Requests served, excluding health probes.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

async fn health(State(backend): State<MockBackend>) -> StatusCode {
    if backend.healthy.load(Ordering::SeqCst) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn named(State(backend): State<MockBackend>) -> impl IntoResponse {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    backend.name
}

async fn created(State(backend): State<MockBackend>) -> impl IntoResponse {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::CREATED,
        AppendHeaders([
            (header::SET_COOKIE, "session=1"),
            (header::SET_COOKIE, "theme=dark"),
            (HeaderName::from_static("x-served-by"), backend.name),
        ]),
        "made it",
    )
}

async fn echo(State(backend): State<MockBackend>, body: String) -> String {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    format!("{}:{}", backend.name, body)
}

async fn slow(State(backend): State<MockBackend>) -> &'static str {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(3)).await;
    "too late"
}

/// Start a mock backend on an ephemeral port.
pub async fn start_backend(name: &'static str, healthy: bool) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = MockBackend {
        name,
        addr: listener.local_addr().unwrap(),
        hits: Arc::new(AtomicUsize::new(0)),
        healthy: Arc::new(AtomicBool::new(healthy)),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/created", get(created))
        .route("/echo", post(echo))
        .route("/slow", get(slow))
        .fallback(named)
        .with_state(backend.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    backend
}

/// Config pointing at `backends`, with fast probes.
pub fn config_for(backends: &[&MockBackend]) -> BalancerConfig {
    let mut config = BalancerConfig::default();
    config.backends = backends.iter().map(|b| b.address()).collect();
    config.health_check.interval_ms = 50;
    config.upstream.timeout_ms = 500;
    config
}

pub struct RunningBalancer {
    pub addr: SocketAddr,
    pub live: LiveSetReader,
    shutdown: Arc<Shutdown>,
    handle: JoinHandle<Result<(), StartupError>>,
}

impl RunningBalancer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until the live set is exactly `expected` (in pool order).
    pub async fn wait_for_live(&self, expected: &[&MockBackend]) {
        let expected: Vec<String> = expected.iter().map(|b| b.address()).collect();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let snapshot = self.live.snapshot();
            let current: Vec<String> = snapshot.addresses().iter().map(|a| a.to_string()).collect();
            // Generation > 0 so an empty expectation waits for a real publication.
            if current == expected && snapshot.generation() > 0 {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "live set stuck at {current:?}, wanted {expected:?}"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("balancer did not stop")
            .unwrap();
        assert!(result.is_ok(), "balancer failed: {result:?}");
    }
}

/// Build and run a balancer on an ephemeral port.
pub async fn start_balancer(config: BalancerConfig) -> RunningBalancer {
    let balancer = Balancer::build(&config).unwrap();
    let live = balancer.live_set();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Arc::new(Shutdown::new());

    let handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { balancer.run(listener, &shutdown).await })
    };

    RunningBalancer {
        addr,
        live,
        shutdown,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}
