//! Local forwarding relay.
//!
//! Forwards any request to the origin named in its `X-Target-URL` header,
//! keeping method, path, query, headers and body. Identity-service requests
//! arrive under `/docuware-proxy` and have that prefix removed.

mod error;

pub use error::RelayError;

use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;
use url::Url;

use crate::platform::transport::{IDENTITY_PREFIX, TARGET_HEADER};

/// Largest request body forwarded.
const MAX_BODY: usize = 512 * 1024 * 1024;

/// Request headers never forwarded upstream.
const STRIPPED_REQUEST_HEADERS: &[&str] = &[TARGET_HEADER, "origin", "host", "content-length"];

/// Response headers dropped on the way back.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "transfer-encoding",
    "content-length",
    "upgrade",
];

#[derive(Clone)]
pub struct RelayState {
    client: reqwest::Client,
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayState {
    pub fn new() -> Self {
        // Certificates are not verified; bodies are passed through undecoded.
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .no_gzip()
            .no_brotli()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

/// Path and query to request upstream.
pub fn upstream_path(path_and_query: &str) -> &str {
    match path_and_query.strip_prefix(IDENTITY_PREFIX) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') || rest.starts_with('?') => rest,
        _ => path_and_query,
    }
}

/// Copy headers, dropping the names in `stripped`.
pub fn filter_headers(headers: &HeaderMap, stripped: &[&str]) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !stripped.iter().any(|s| name.as_str().eq_ignore_ascii_case(s)) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Resolve the upstream URL for an inbound request.
pub fn upstream_url(target: &str, path_and_query: &str) -> Result<String, RelayError> {
    let origin = Url::parse(target).map_err(|e| RelayError::InvalidTarget(format!("{}: {}", target, e)))?;
    if !matches!(origin.scheme(), "http" | "https") {
        return Err(RelayError::InvalidTarget(target.to_string()));
    }
    Ok(format!(
        "{}{}",
        target.trim_end_matches('/'),
        upstream_path(path_and_query)
    ))
}

async fn forward(State(state): State<RelayState>, req: Request) -> Result<Response, RelayError> {
    if req.method() == Method::OPTIONS {
        return Ok(StatusCode::OK.into_response());
    }

    let target = req
        .headers()
        .get(TARGET_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(RelayError::MissingTarget {
            method: req.method().to_string(),
            uri: req.uri().to_string(),
        })?;

    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let url = upstream_url(&target, &path_and_query)?;
    info!("[Proxy] Forwarding {} {} -> {}", req.method(), path_and_query, target);

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY)
        .await
        .map_err(|e| RelayError::Body(e.to_string()))?;

    let upstream = state
        .client
        .request(parts.method, &url)
        .headers(filter_headers(&parts.headers, STRIPPED_REQUEST_HEADERS))
        .body(bytes)
        .send()
        .await?;

    let status = upstream.status();
    let headers = filter_headers(upstream.headers(), HOP_BY_HOP);
    let body: Bytes = upstream.bytes().await?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

/// Router forwarding every path.
pub fn create_router(state: RelayState) -> Router {
    Router::new()
        .fallback(forward)
        .layer(
            CorsLayer::permissive().expose_headers([HeaderName::from_static("content-disposition")]),
        )
        .with_state(state)
}

/// Run the relay until the process is stopped.
pub async fn serve(host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(RelayState::new());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Relay running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
