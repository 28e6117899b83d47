//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Per-backend timer (monitor.rs)
//!     → probe.rs (GET /health, bounded by the upstream timeout)
//!     → report outcome to the publisher task
//!     → state.rs (Unknown/Live/Dead, transition logged)
//!     → rebuild full live set → atomic publish
//! ```
//!
//! # Design Decisions
//! - Liveness follows the latest probe outcome exactly (no thresholds)
//! - Probe failures never reach the request path; they only shrink the live set
//! - Health state is per-backend; one backend failing never affects another

pub mod monitor;
pub mod probe;
pub mod state;

pub use monitor::{HealthMonitor, LiveTracker, MonitorHandle};
pub use probe::{LivenessProbe, Probe, ProbeFailure};
pub use state::{BackendHealth, Liveness, Transition};
