//! HTTP transport with optional routing through the local relay.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use url::Url;

use super::error::PlatformError;

/// Header naming the upstream origin of a relayed request.
pub const TARGET_HEADER: &str = "x-target-url";

/// Path prefix the relay strips from identity-service requests.
pub const IDENTITY_PREFIX: &str = "/docuware-proxy";

/// Longest error body kept in error messages.
const MAX_ERROR_BODY: usize = 500;

/// Where a request is actually sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub url: String,
    /// Upstream origin, set when going through the relay.
    pub target: Option<String>,
}

/// Rewrite `url` for the relay at `relay`, if any.
///
/// Relayed requests keep path and query, gain `prefix`, and carry the
/// original origin in [`TARGET_HEADER`].
pub fn route(url: &str, relay: Option<&str>, prefix: &str) -> Result<Route, PlatformError> {
    let target = Url::parse(url).map_err(|e| PlatformError::InvalidUrl(format!("{}: {}", url, e)))?;
    let Some(relay) = relay else {
        return Ok(Route {
            url: target.to_string(),
            target: None,
        });
    };

    let mut relayed = format!("{}{}{}", relay.trim_end_matches('/'), prefix, target.path());
    if let Some(query) = target.query() {
        relayed.push('?');
        relayed.push_str(query);
    }
    Ok(Route {
        url: relayed,
        target: Some(target.origin().ascii_serialization()),
    })
}

/// Shared reqwest client plus relay routing.
#[derive(Clone)]
pub struct Transport {
    client: Client,
    relay_url: Option<String>,
    transfer_timeout: Duration,
}

impl Transport {
    pub fn new(timeout: Duration, transfer_timeout: Duration, relay_url: Option<String>) -> Self {
        let client = Client::builder()
            .user_agent(concat!("docusync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            relay_url,
            transfer_timeout,
        }
    }

    pub fn relay_url(&self) -> Option<&str> {
        self.relay_url.as_deref()
    }

    /// Build a request to `url`, routed through the relay when configured.
    pub fn request(&self, method: Method, url: &str, prefix: &str) -> Result<RequestBuilder, PlatformError> {
        let route = route(url, self.relay_url.as_deref(), prefix)?;
        let mut builder = self.client.request(method, &route.url);
        if let Some(target) = route.target {
            builder = builder.header(TARGET_HEADER, target);
        }
        Ok(builder)
    }

    /// Like [`Transport::request`] but with the long timeout for binary transfers.
    pub fn transfer(&self, method: Method, url: &str) -> Result<RequestBuilder, PlatformError> {
        Ok(self.request(method, url, "")?.timeout(self.transfer_timeout))
    }
}

/// Turn a non-success response into [`PlatformError::Status`].
pub async fn check(resp: Response) -> Result<Response, PlatformError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let mut message = resp.text().await.unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    Err(PlatformError::Status {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_route() {
        let r = route("https://acme.docuware.cloud/DocuWare/Platform/FileCabinets", None, "").unwrap();
        assert_eq!(r.url, "https://acme.docuware.cloud/DocuWare/Platform/FileCabinets");
        assert_eq!(r.target, None);
    }

    #[test]
    fn test_relayed_route_keeps_path_and_query() {
        let r = route(
            "https://acme.docuware.cloud/DocuWare/Platform/FileCabinets/c1/Documents?count=1000",
            Some("http://localhost:3001/"),
            "",
        )
        .unwrap();
        assert_eq!(
            r.url,
            "http://localhost:3001/DocuWare/Platform/FileCabinets/c1/Documents?count=1000"
        );
        assert_eq!(r.target.as_deref(), Some("https://acme.docuware.cloud"));
    }

    #[test]
    fn test_identity_route_uses_prefix() {
        let r = route(
            "https://login.docuware.cloud/bcb91903/.well-known/openid-configuration",
            Some("http://localhost:3001"),
            IDENTITY_PREFIX,
        )
        .unwrap();
        assert_eq!(
            r.url,
            "http://localhost:3001/docuware-proxy/bcb91903/.well-known/openid-configuration"
        );
        assert_eq!(r.target.as_deref(), Some("https://login.docuware.cloud"));
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(route("not a url", None, ""), Err(PlatformError::InvalidUrl(_))));
    }
}
