//! Timeout enforcement.
//!
//! # Responsibilities
//! - Give every outbound call a deadline
//! - Derive the per-call budget from what is left of the inbound request
//!
//! # Design Decisions
//! - A deadline is fixed when the request arrives; later calls only get the remainder
//! - An expired deadline means the call is not attempted at all

use std::time::Duration;

use tokio::time::Instant;

/// Point in time after which an outbound call must be abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// Time left, or `None` once the deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        let left = self.at.saturating_duration_since(Instant::now());
        if left.is_zero() {
            None
        } else {
            Some(left)
        }
    }

    /// Per-call timeout: the remaining budget, capped at `ceiling`.
    pub fn budget(&self, ceiling: Duration) -> Option<Duration> {
        self.remaining().map(|left| left.min(ceiling))
    }
}
