//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Build pool, client, monitor, server → Spawn monitor → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Server stops accepting and drains → Probe tasks exit → Publisher exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - Every repeating task has an explicit stop condition (the shutdown signal)

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{Balancer, StartupError};
