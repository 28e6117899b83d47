//! Backend liveness state machine.
//!
//! # States
//! - Unknown: not probed yet, excluded from routing
//! - Live: last probe succeeded, eligible for routing
//! - Dead: last probe failed, excluded from routing
//!
//! # State Transitions
//! ```text
//! Unknown → Live | Dead: first probe outcome
//! Live → Dead:           one failed probe
//! Dead → Live:           one successful probe
//! ```
//!
//! No hysteresis: a single probe outcome decides the state.

use std::fmt;
use std::sync::Arc;

use crate::load_balancer::backend::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Liveness {
    #[default]
    Unknown,
    Live,
    Dead,
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Liveness::Unknown => "unknown",
            Liveness::Live => "live",
            Liveness::Dead => "dead",
        };
        f.write_str(name)
    }
}

/// A state change caused by one probe outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Liveness,
    pub to: Liveness,
}

/// Latest known liveness of one backend.
#[derive(Debug, Clone)]
pub struct BackendHealth {
    backend: Arc<Backend>,
    state: Liveness,
}

impl BackendHealth {
    pub fn new(backend: Arc<Backend>) -> Self {
        Self {
            backend,
            state: Liveness::Unknown,
        }
    }

    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }

    pub fn state(&self) -> Liveness {
        self.state
    }

    pub fn is_live(&self) -> bool {
        self.state == Liveness::Live
    }

    /// Record one probe outcome. Returns the transition if the state changed.
    pub fn observe(&mut self, live: bool) -> Option<Transition> {
        let next = if live { Liveness::Live } else { Liveness::Dead };
        if next == self.state {
            return None;
        }

        let transition = Transition {
            from: self.state,
            to: next,
        };
        self.state = next;
        Some(transition)
    }
}
