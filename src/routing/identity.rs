//! Client identity derivation.
//!
//! # Responsibilities
//! - Derive the hashing key for one request
//! - Apply identity sources in a fixed, explicit order (first match wins)
//!
//! # Design Decisions
//! - Each source is its own type; the chain is just an ordered list of them
//! - Missing or malformed headers never error; they fall through to the
//!   next source, ending at the remote socket address

use std::fmt;
use std::net::SocketAddr;

use axum::http::{HeaderMap, HeaderName};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// The key a request is hashed on. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One place a client identity can come from.
pub trait IdentitySource: Send + Sync + fmt::Debug {
    /// Returns the identity if this source has a non-empty one.
    fn extract(&self, headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<String>;
}

/// First entry of `X-Forwarded-For`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardedFor;

impl IdentitySource for ForwardedFor {
    fn extract(&self, headers: &HeaderMap, _remote: Option<SocketAddr>) -> Option<String> {
        let value = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
        let first = value.split(',').next()?.trim();
        non_empty(first)
    }
}

/// `X-Real-IP`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealIp;

impl IdentitySource for RealIp {
    fn extract(&self, headers: &HeaderMap, _remote: Option<SocketAddr>) -> Option<String> {
        let value = headers.get(X_REAL_IP)?.to_str().ok()?;
        non_empty(value.trim())
    }
}

/// Host portion of the peer socket address.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteAddr;

impl IdentitySource for RemoteAddr {
    fn extract(&self, _headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<String> {
        let remote = remote?.to_string();
        non_empty(strip_port(&remote))
    }
}

/// Drop a trailing `:port`, keeping IPv6 brackets intact.
pub fn strip_port(addr: &str) -> &str {
    match addr.rfind(':') {
        Some(idx) if !addr[idx..].contains(']') => &addr[..idx],
        _ => addr,
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Ordered identity sources.
#[derive(Debug)]
pub struct IdentityChain {
    sources: Vec<Box<dyn IdentitySource>>,
}

impl IdentityChain {
    pub fn new(sources: Vec<Box<dyn IdentitySource>>) -> Self {
        Self { sources }
    }

    /// Derive the identity for one request.
    ///
    /// If no source matches (no headers and no peer address), the identity is
    /// empty, which still hashes to a valid backend.
    pub fn derive(&self, headers: &HeaderMap, remote: Option<SocketAddr>) -> ClientIdentity {
        let value = self
            .sources
            .iter()
            .find_map(|source| source.extract(headers, remote))
            .unwrap_or_default();
        ClientIdentity(value)
    }
}

impl Default for IdentityChain {
    /// `X-Forwarded-For`, then `X-Real-IP`, then the peer address.
    fn default() -> Self {
        Self::new(vec![
            Box::new(ForwardedFor),
            Box::new(RealIp),
            Box::new(RemoteAddr),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn remote() -> Option<SocketAddr> {
        Some("5.5.5.5:4321".parse().unwrap())
    }

    fn headers(pairs: &[(HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_forwarded_for_wins() {
        let chain = IdentityChain::default();
        let h = headers(&[
            (X_FORWARDED_FOR, "9.9.9.9, 1.1.1.1"),
            (X_REAL_IP, "2.2.2.2"),
        ]);
        assert_eq!(chain.derive(&h, remote()).as_str(), "9.9.9.9");
    }

    #[test]
    fn test_real_ip_when_no_forwarded_for() {
        let chain = IdentityChain::default();
        let h = headers(&[(X_REAL_IP, "2.2.2.2")]);
        assert_eq!(chain.derive(&h, remote()).as_str(), "2.2.2.2");
    }

    #[test]
    fn test_remote_addr_without_port() {
        let chain = IdentityChain::default();
        assert_eq!(chain.derive(&HeaderMap::new(), remote()).as_str(), "5.5.5.5");
    }

    #[test]
    fn test_ipv6_remote_keeps_brackets() {
        let chain = IdentityChain::default();
        let v6: SocketAddr = "[::1]:9000".parse().unwrap();
        assert_eq!(chain.derive(&HeaderMap::new(), Some(v6)).as_str(), "[::1]");
    }

    #[test]
    fn test_empty_headers_fall_through() {
        let chain = IdentityChain::default();
        let h = headers(&[(X_FORWARDED_FOR, " , 1.1.1.1"), (X_REAL_IP, "   ")]);
        assert_eq!(chain.derive(&h, remote()).as_str(), "5.5.5.5");
    }

    #[test]
    fn test_non_utf8_header_falls_through() {
        let chain = IdentityChain::default();
        let mut h = HeaderMap::new();
        h.insert(X_FORWARDED_FOR, HeaderValue::from_bytes(b"\xff\xfe").unwrap());
        h.insert(X_REAL_IP, HeaderValue::from_static("2.2.2.2"));
        assert_eq!(chain.derive(&h, remote()).as_str(), "2.2.2.2");
    }

    #[test]
    fn test_forwarded_for_is_trimmed() {
        let chain = IdentityChain::default();
        let h = headers(&[(X_FORWARDED_FOR, "  3.3.3.3  ,4.4.4.4")]);
        assert_eq!(chain.derive(&h, None).as_str(), "3.3.3.3");
    }

    #[test]
    fn test_nothing_available_is_empty_identity() {
        let chain = IdentityChain::default();
        assert_eq!(chain.derive(&HeaderMap::new(), None).as_str(), "");
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("5.5.5.5:4321"), "5.5.5.5");
        assert_eq!(strip_port("[::1]:80"), "[::1]");
        assert_eq!(strip_port("[::1]"), "[::1]");
        assert_eq!(strip_port("host"), "host");
    }
}
