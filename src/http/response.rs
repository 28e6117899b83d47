//! Client-visible failure responses.
//!
//! Both routing failures (no live backend) and forwarding failures become a
//! bare `503 Service Unavailable`. No body is promised to the client.

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;

/// How one request through the frontend ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The backend's response was relayed.
    Completed,
    /// The live set was empty; nothing was forwarded.
    Unavailable,
    /// The chosen backend could not be reached in time.
    ForwardFailed,
}

impl RequestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestOutcome::Completed => "completed",
            RequestOutcome::Unavailable => "unavailable",
            RequestOutcome::ForwardFailed => "forward_failed",
        }
    }
}

/// An empty `503 Service Unavailable`.
pub fn service_unavailable() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
    response
}
