//! Outbound HTTP clients.
//!
//! Probes go through `reqwest`. Relayed requests go through the hyper
//! client so the client's request target reaches the backend untouched.

use axum::body::Body;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

/// Client used to relay requests to backends (plain HTTP or HTTPS).
pub type ForwardClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the client used for health probes.
///
/// Environment proxies are ignored and redirects are handed back to the
/// caller untouched. Per-call timeouts are set on each request.
pub fn outbound_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

/// Build the client used to relay requests.
///
/// It never follows redirects and never rewrites the path or query.
pub fn forward_client() -> ForwardClient {
    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new()).build(connector)
}
