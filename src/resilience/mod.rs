//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives → Deadline fixed (timeouts.rs)
//!     → forward call gets the remaining budget
//!     → on expiry: call abandoned, request answered with 503
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries, no circuit breaker: failures surface to the caller immediately

pub mod timeouts;

pub use timeouts::Deadline;
