//! Active health monitoring.
//!
//! # Responsibilities
//! - Probe every backend on its own repeating timer
//! - Track per-backend liveness from probe outcomes
//! - Republish the complete live set after every probe
//!
//! # Design Decisions
//! - One task per backend, all running concurrently with request handling
//! - Probe tasks only report outcomes; a single publisher task owns the
//!   per-backend state and the live set writer, so there is exactly one writer
//! - The publisher rebuilds the whole set from the latest known outcome of
//!   every backend and swaps it in as one unit
//! - Every task stops on the shutdown signal

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::health::probe::{LivenessProbe, Probe, ProbeFailure};
use crate::health::state::{BackendHealth, Liveness, Transition};
use crate::lifecycle::shutdown::{Shutdown, ShutdownSignal};
use crate::load_balancer::backend::Backend;
use crate::load_balancer::live_set::{self, LiveSet, LiveSetPublisher, LiveSetReader};
use crate::load_balancer::pool::BackendPool;
use crate::observability::metrics;

/// Outcome of one probe, sent from a probe task to the publisher.
#[derive(Debug)]
struct ProbeReport {
    index: usize,
    outcome: Result<(), ProbeFailure>,
}

/// Per-backend liveness plus the live set writer.
#[derive(Debug)]
pub struct LiveTracker {
    states: Vec<BackendHealth>,
    publisher: LiveSetPublisher,
}

impl LiveTracker {
    pub fn new(pool: &BackendPool, publisher: LiveSetPublisher) -> Self {
        let states = pool.iter().cloned().map(BackendHealth::new).collect();
        Self { states, publisher }
    }

    pub fn state(&self, index: usize) -> Option<Liveness> {
        self.states.get(index).map(BackendHealth::state)
    }

    /// Apply one probe outcome and publish the resulting live set.
    pub fn apply(&mut self, index: usize, outcome: &Result<(), ProbeFailure>) -> Option<Arc<LiveSet>> {
        let health = self.states.get_mut(index)?;
        if let Some(transition) = health.observe(outcome.is_ok()) {
            log_transition(health.backend(), transition, outcome);
            metrics::record_backend_liveness(health.backend().address(), health.is_live());
        }

        let previous = self.publisher.reader().snapshot();
        let members: Vec<Arc<Backend>> = self
            .states
            .iter()
            .filter(|h| h.is_live())
            .map(|h| h.backend().clone())
            .collect();
        let snapshot = self.publisher.publish(members);

        if previous.addresses() != snapshot.addresses() {
            tracing::info!(
                generation = snapshot.generation(),
                healthy = ?snapshot.addresses(),
                "Healthy servers"
            );
        } else {
            tracing::debug!(
                generation = snapshot.generation(),
                healthy = ?snapshot.addresses(),
                "Healthy servers"
            );
        }
        metrics::record_live_set(snapshot.len());

        Some(snapshot)
    }
}

fn log_transition(backend: &Backend, transition: Transition, outcome: &Result<(), ProbeFailure>) {
    match (transition.to, outcome) {
        (Liveness::Dead, Err(reason)) => tracing::warn!(
            backend = %backend,
            from = %transition.from,
            to = %transition.to,
            reason = %reason,
            "Backend is down"
        ),
        _ => tracing::info!(
            backend = %backend,
            from = %transition.from,
            to = %transition.to,
            "Backend is up"
        ),
    }
}

/// Keeps the live set in step with backend liveness.
pub struct HealthMonitor<P = LivenessProbe> {
    pool: BackendPool,
    probe: Arc<P>,
    interval: Duration,
    publisher: LiveSetPublisher,
}

impl<P: Probe> HealthMonitor<P> {
    /// Create a monitor and the reader side of the live set it maintains.
    ///
    /// The live set starts empty and fills in as the first probes complete.
    pub fn new(pool: BackendPool, probe: P, interval: Duration) -> (Self, LiveSetReader) {
        let (publisher, reader) = live_set::channel();
        let monitor = Self {
            pool,
            probe: Arc::new(probe),
            // `time::interval` panics on a zero period.
            interval: interval.max(Duration::from_millis(1)),
            publisher,
        };
        (monitor, reader)
    }

    /// Start one probe task per backend plus the publisher task.
    pub fn spawn(self, shutdown: &Shutdown) -> MonitorHandle {
        tracing::info!(
            backends = self.pool.len(),
            interval_ms = self.interval.as_millis() as u64,
            "Health monitor starting"
        );

        let (reports_tx, reports_rx) = mpsc::channel(self.pool.len().max(1) * 4);
        let mut tasks = Vec::with_capacity(self.pool.len() + 1);

        for (index, backend) in self.pool.iter().enumerate() {
            tasks.push(tokio::spawn(probe_loop(
                index,
                backend.clone(),
                self.probe.clone(),
                self.interval,
                reports_tx.clone(),
                shutdown.subscribe(),
            )));
        }
        // The publisher exits once every probe task has dropped its sender.
        drop(reports_tx);

        let tracker = LiveTracker::new(&self.pool, self.publisher);
        tasks.push(tokio::spawn(publish_loop(reports_rx, tracker)));

        MonitorHandle { tasks }
    }
}

async fn probe_loop<P: Probe>(
    index: usize,
    backend: Arc<Backend>,
    probe: Arc<P>,
    interval: Duration,
    reports: mpsc::Sender<ProbeReport>,
    mut shutdown: ShutdownSignal,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::debug!(backend = %backend, "Probe task stopping");
                break;
            }
            _ = ticker.tick() => {
                // A health check in flight must not hold up shutdown.
                let outcome = tokio::select! {
                    biased;
                    _ = shutdown.recv() => {
                        tracing::debug!(backend = %backend, "Health check abandoned on shutdown");
                        break;
                    }
                    outcome = probe.check(&backend) => outcome,
                };
                match &outcome {
                    Ok(()) => tracing::debug!(backend = %backend, healthy = true, "Probe finished"),
                    Err(reason) => tracing::debug!(backend = %backend, healthy = false, reason = %reason, "Probe finished"),
                }
                if reports.send(ProbeReport { index, outcome }).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn publish_loop(mut reports: mpsc::Receiver<ProbeReport>, mut tracker: LiveTracker) {
    while let Some(report) = reports.recv().await {
        tracker.apply(report.index, &report.outcome);
    }
    tracing::info!("Health monitor stopped");
}

/// Handles to the running monitor tasks.
#[derive(Debug)]
pub struct MonitorHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Wait for every monitor task to finish (after shutdown is triggered).
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Health monitor task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::backend::Scheme;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn pool() -> BackendPool {
        BackendPool::new(["a:1", "b:2", "c:3"], Scheme::Http).unwrap()
    }

    const B: usize = 1;

    #[test]
    fn test_failed_probe_drops_backend_from_next_publication() {
        let (publisher, reader) = live_set::channel();
        let mut tracker = LiveTracker::new(&pool(), publisher);
        for index in 0..3 {
            tracker.apply(index, &Ok(()));
        }
        assert_eq!(reader.snapshot().addresses(), vec!["a:1", "b:2", "c:3"]);

        let after_failure = tracker.apply(B, &Err(ProbeFailure::Timeout)).unwrap();
        assert_eq!(after_failure.addresses(), vec!["a:1", "c:3"]);
        assert_eq!(reader.snapshot().generation(), after_failure.generation());
        assert_eq!(tracker.state(B), Some(Liveness::Dead));

        let after_success = tracker.apply(B, &Ok(())).unwrap();
        assert_eq!(after_success.addresses(), vec!["a:1", "b:2", "c:3"]);
        assert_eq!(after_success.generation(), after_failure.generation() + 1);
    }

    #[test]
    fn test_every_probe_republishes() {
        let (publisher, reader) = live_set::channel();
        let mut tracker = LiveTracker::new(&pool(), publisher);
        tracker.apply(0, &Ok(()));
        tracker.apply(0, &Ok(()));
        tracker.apply(2, &Err(ProbeFailure::Transport("refused".into())));

        let snapshot = reader.snapshot();
        assert_eq!(snapshot.generation(), 3);
        assert_eq!(snapshot.addresses(), vec!["a:1"]);
    }

    #[test]
    fn test_unprobed_backends_are_excluded() {
        let (publisher, _reader) = live_set::channel();
        let mut tracker = LiveTracker::new(&pool(), publisher);
        let snapshot = tracker.apply(2, &Ok(())).unwrap();
        assert_eq!(snapshot.addresses(), vec!["c:3"]);
        assert_eq!(tracker.state(0), Some(Liveness::Unknown));
    }

    #[test]
    fn test_out_of_range_report_is_ignored() {
        let (publisher, reader) = live_set::channel();
        let mut tracker = LiveTracker::new(&pool(), publisher);
        assert!(tracker.apply(7, &Ok(())).is_none());
        assert_eq!(reader.snapshot().generation(), 0);
    }

    /// Probe whose answers are flipped by the test.
    #[derive(Default)]
    struct ScriptedProbe {
        dead: Mutex<HashMap<String, bool>>,
        calls: AtomicUsize,
    }

    impl ScriptedProbe {
        fn set_dead(&self, address: &str, dead: bool) {
            self.dead.lock().unwrap().insert(address.to_string(), dead);
        }
    }

    impl Probe for Arc<ScriptedProbe> {
        async fn check(&self, backend: &Backend) -> Result<(), ProbeFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let dead = self.dead.lock().unwrap().get(backend.address()).copied().unwrap_or(false);
            if dead {
                Err(ProbeFailure::Status(axum::http::StatusCode::SERVICE_UNAVAILABLE))
            } else {
                Ok(())
            }
        }
    }

    async fn wait_for(reader: &LiveSetReader, expected: &[&str]) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if reader.snapshot().addresses() == expected {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "live set never became {expected:?}, last {:?}",
                reader.snapshot().addresses()
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_monitor_tracks_liveness_and_stops_on_shutdown() {
        let probe = Arc::new(ScriptedProbe::default());
        let (monitor, reader) = HealthMonitor::new(pool(), probe.clone(), Duration::from_millis(20));
        assert!(reader.snapshot().is_empty());

        let shutdown = Shutdown::new();
        let handle = monitor.spawn(&shutdown);

        wait_for(&reader, &["a:1", "b:2", "c:3"]).await;

        probe.set_dead("b:2", true);
        wait_for(&reader, &["a:1", "c:3"]).await;

        probe.set_dead("b:2", false);
        wait_for(&reader, &["a:1", "b:2", "c:3"]).await;

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(2), handle.join())
            .await
            .expect("monitor tasks should stop after shutdown");

        let calls = probe.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), calls, "no probes after shutdown");
    }

    /// Health check that never answers.
    #[derive(Default)]
    struct StalledCheck {
        started: AtomicUsize,
    }

    impl Probe for Arc<StalledCheck> {
        async fn check(&self, _backend: &Backend) -> Result<(), ProbeFailure> {
            self.started.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_shutdown_cancels_health_check_in_flight() {
        let stalled = Arc::new(StalledCheck::default());
        let (monitor, reader) = HealthMonitor::new(pool(), stalled.clone(), Duration::from_millis(20));

        let shutdown = Shutdown::new();
        let handle = monitor.spawn(&shutdown);

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while stalled.started.load(Ordering::SeqCst) < 3 {
            assert!(tokio::time::Instant::now() < deadline, "health checks never started");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle.join())
            .await
            .expect("stalled health checks must not delay shutdown");
        assert_eq!(reader.snapshot().generation(), 0);
    }
}
