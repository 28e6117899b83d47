//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Config backends → pool.rs (immutable BackendPool)
//!
//! Health monitor → live_set.rs (LiveSetPublisher::publish, atomic swap)
//!
//! Request → identity derived
//!     → live_set.rs (LiveSetReader::snapshot)
//!     → selector.rs (fnv1a(identity) % live.len())
//!     → Backend or Unavailable
//! ```
//!
//! # Design Decisions
//! - Selection is stateless; all state lives in the published snapshot
//! - Unhealthy backends are absent from the snapshot, never filtered per request
//! - A request computes its decision from exactly one snapshot

pub mod backend;
pub mod live_set;
pub mod pool;
pub mod selector;

pub use backend::{Backend, BackendError, Scheme};
pub use live_set::{LiveSet, LiveSetPublisher, LiveSetReader};
pub use pool::BackendPool;
pub use selector::{select, RoutingDecision};
