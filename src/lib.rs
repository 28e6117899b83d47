//! Sticky HTTP load balancer library.
//!
//! Routes each client to one live backend chosen by hashing its identity,
//! while a health monitor keeps the live backend set current.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::schema::BalancerConfig;
pub use http::HttpServer;
pub use lifecycle::{Balancer, Shutdown};
