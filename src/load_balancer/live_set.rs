//! The published set of live backends.
//!
//! # Responsibilities
//! - Hold the latest complete live-backend snapshot
//! - Let exactly one writer replace it as a unit
//! - Let any number of readers take a snapshot without blocking
//!
//! # Design Decisions
//! - Backed by `ArcSwap`: publication is a single pointer swap, readers never
//!   observe a set mid-rebuild and never take a lock on the request path
//! - The writer half is not `Clone`; only the health monitor holds it
//! - Every publication carries a generation number for logging and tests

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::load_balancer::backend::Backend;

/// One immutable snapshot of the backends eligible for routing.
#[derive(Debug, Clone, Default)]
pub struct LiveSet {
    generation: u64,
    members: Vec<Arc<Backend>>,
}

impl LiveSet {
    pub fn new(generation: u64, members: Vec<Arc<Backend>>) -> Self {
        Self { generation, members }
    }

    /// Monotonic publication counter; the initial empty set is generation 0.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Live backends, in pool order.
    pub fn members(&self) -> &[Arc<Backend>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.members.iter().any(|b| b.address() == address)
    }

    pub fn addresses(&self) -> Vec<&str> {
        self.members.iter().map(|b| b.address()).collect()
    }
}

/// Create an empty live set store, returning its writer and a reader.
pub fn channel() -> (LiveSetPublisher, LiveSetReader) {
    let current = Arc::new(ArcSwap::from_pointee(LiveSet::default()));
    (
        LiveSetPublisher {
            current: current.clone(),
            generation: 0,
        },
        LiveSetReader { current },
    )
}

/// The single writer of the live set.
#[derive(Debug)]
pub struct LiveSetPublisher {
    current: Arc<ArcSwap<LiveSet>>,
    generation: u64,
}

impl LiveSetPublisher {
    /// Atomically replace the published set with `members`.
    pub fn publish(&mut self, members: Vec<Arc<Backend>>) -> Arc<LiveSet> {
        self.generation += 1;
        let snapshot = Arc::new(LiveSet::new(self.generation, members));
        self.current.store(snapshot.clone());
        snapshot
    }

    pub fn reader(&self) -> LiveSetReader {
        LiveSetReader {
            current: self.current.clone(),
        }
    }
}

/// Read-only handle to the published live set.
#[derive(Debug, Clone)]
pub struct LiveSetReader {
    current: Arc<ArcSwap<LiveSet>>,
}

impl LiveSetReader {
    /// A point-in-time copy of the current live set.
    pub fn snapshot(&self) -> Arc<LiveSet> {
        self.current.load_full()
    }
}
