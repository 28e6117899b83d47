//! Request forwarding to a chosen backend.
//!
//! # Responsibilities
//! - Copy the inbound request, retargeted at the backend
//! - Relay status, every response header, and the streamed body
//! - Report transport failures and timeouts without writing a response
//!
//! # Design Decisions
//! - No retries and no fallback backend; the caller decides what to send
//! - Bodies are streamed in both directions, never buffered whole
//! - The request path and query are relayed byte for byte; dot segments and
//!   unusual query characters are the backend's business
//! - The `Host` header and hop-by-hop headers are not copied outbound;
//!   the outbound `Host` comes from the backend address
//! - The outbound response owns its connection, so it is released exactly
//!   once on every path (dropped on error, or when the relayed body ends)

use std::time::Duration;

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::Request;
use axum::response::Response;
use thiserror::Error;

use crate::http::client::ForwardClient;
use crate::load_balancer::backend::Backend;
use crate::resilience::timeouts::Deadline;

/// Why a forward attempt produced no response.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("request budget exhausted before reaching {backend}")]
    DeadlineExceeded { backend: String },

    #[error("cannot build request target for {backend}: {source}")]
    Target {
        backend: String,
        #[source]
        source: axum::http::Error,
    },

    #[error("timed out waiting for {backend}")]
    Timeout { backend: String },

    #[error("failed to get response from {backend}: {source}")]
    Transport {
        backend: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },
}

/// Headers that describe one hop and must not be copied to the next.
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Inbound request headers as they should be sent to the backend.
fn outbound_headers(inbound: &HeaderMap) -> HeaderMap {
    // Headers listed in `Connection` are hop-by-hop too.
    let listed: Vec<String> = inbound
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .collect();

    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if name == header::HOST
            || HOP_BY_HOP.contains(name)
            || listed.iter().any(|l| l == name.as_str())
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Relays one request to one backend.
#[derive(Clone)]
pub struct RequestForwarder {
    client: ForwardClient,
    timeout: Duration,
    trace_header: Option<HeaderName>,
}

impl RequestForwarder {
    pub fn new(client: ForwardClient, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            trace_header: None,
        }
    }

    /// Name the serving backend in `name` on every relayed response.
    pub fn with_trace_header(mut self, name: HeaderName) -> Self {
        self.trace_header = Some(name);
        self
    }

    /// Forward `request` to `backend` and return the backend's response.
    ///
    /// The timeout covers connecting and receiving the response head; the
    /// body is streamed to the client as it arrives.
    pub async fn forward(
        &self,
        backend: &Backend,
        request: Request<Body>,
        deadline: Deadline,
    ) -> Result<Response, ForwardError> {
        let budget = deadline
            .budget(self.timeout)
            .ok_or_else(|| ForwardError::DeadlineExceeded {
                backend: backend.address().to_string(),
            })?;

        let (parts, body) = request.into_parts();
        let target = backend
            .target_uri(parts.uri.path_and_query())
            .map_err(|source| ForwardError::Target {
                backend: backend.address().to_string(),
                source,
            })?;

        let mut outbound = Request::new(body);
        *outbound.method_mut() = parts.method;
        *outbound.uri_mut() = target.clone();
        *outbound.headers_mut() = outbound_headers(&parts.headers);

        let upstream = match tokio::time::timeout(budget, self.client.request(outbound)).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => {
                return Err(ForwardError::Transport {
                    backend: backend.address().to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(ForwardError::Timeout {
                    backend: backend.address().to_string(),
                })
            }
        };

        let (upstream, incoming) = upstream.into_parts();
        tracing::info!(status = upstream.status.as_u16(), url = %target, "fwd");

        let mut headers = upstream.headers;
        if let Some(name) = &self.trace_header {
            if let Ok(value) = HeaderValue::from_str(backend.address()) {
                headers.insert(name.clone(), value);
            }
        }

        let mut response = Response::new(Body::new(incoming));
        *response.status_mut() = upstream.status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
