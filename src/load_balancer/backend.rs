//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single configured backend server
//! - Build outbound targets for probes and relayed requests

use std::fmt;

use axum::http::uri::{Authority, InvalidUri, PathAndQuery};
use axum::http::Uri;
use thiserror::Error;
use url::Url;

/// Transport used to reach every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn from_https(https: bool) -> Self {
        if https {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Why a configured backend address was rejected.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid backend authority: {0}")]
    Authority(#[from] InvalidUri),
}

/// A single backend server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    /// The configured `host:port` address.
    address: String,
    scheme: Scheme,
    authority: Authority,
    /// Pre-calculated base URL for probes.
    base_url: Url,
}

impl Backend {
    /// Create a new backend reached over `scheme`.
    pub fn new(address: impl Into<String>, scheme: Scheme) -> Result<Self, BackendError> {
        let address = address.into();
        let base_url = Url::parse(&format!("{}://{}", scheme.as_str(), address))?;
        let authority = address.parse::<Authority>()?;
        Ok(Self {
            address,
            scheme,
            authority,
            base_url,
        })
    }

    /// The configured address, as written in the backend list.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// URL for a fixed `path` on this backend.
    ///
    /// The path is set rather than joined, so it can never redirect the call
    /// to another host. `Url` normalizes the path, so this is only for paths
    /// the balancer owns (the health check).
    pub fn url_for(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url
    }

    /// Absolute target for a relayed request.
    ///
    /// The client's path and query are carried over byte for byte; only the
    /// scheme and authority change.
    pub fn target_uri(&self, path_and_query: Option<&PathAndQuery>) -> Result<Uri, axum::http::Error> {
        let path_and_query = path_and_query
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));
        Uri::builder()
            .scheme(self.scheme.as_str())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}
