//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (headers, peer address)
//!     → identity.rs (ordered identity sources, first match wins)
//!     → ClientIdentity
//!     → load_balancer::select
//! ```
//!
//! # Design Decisions
//! - Deterministic: same request headers and peer always yield the same identity
//! - Sources are explicit and ordered, never an implicit if/else chain

pub mod identity;

pub use identity::{ClientIdentity, IdentityChain, IdentitySource};
