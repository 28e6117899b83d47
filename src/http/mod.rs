//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, frontend handler)
//!     → routing::identity (client identity)
//!     → load_balancer::select (backend or Unavailable)
//!     → forward.rs (outbound copy via client.rs, streamed response)
//!     → response.rs (503 on any failure)
//!     → Send to client
//! ```

pub mod client;
pub mod forward;
pub mod response;
pub mod server;

pub use forward::{ForwardError, RequestForwarder};
pub use server::{AppState, HttpServer};
