//! Password-grant login against the platform's identity service.

use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::error::AuthError;
use super::session::Session;
use super::transport::{Transport, IDENTITY_PREFIX};

pub const CLIENT_ID: &str = "docuware.platform.net.client";
pub const SCOPE: &str = "docuware.platform";

const CLOUD_DOMAIN: &str = ".docuware.cloud";

#[derive(Debug, Deserialize)]
struct IdentityServiceInfo {
    #[serde(rename = "IdentityServiceUrl")]
    identity_service_url: String,
}

#[derive(Debug, Deserialize)]
struct OpenIdConfiguration {
    token_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Trim whitespace and trailing slashes; cloud hosts are forced onto HTTPS.
pub fn normalize_url(url: &str) -> String {
    let mut base = url.trim().trim_end_matches('/').to_string();
    if base.contains(CLOUD_DOMAIN) {
        if let Some(rest) = base.strip_prefix("http://") {
            warn!("Automatically converted HTTP to HTTPS for DocuWare Cloud");
            base = format!("https://{}", rest);
        }
    }
    base
}

/// Organization id: the identity URL's path without the leading slash.
pub fn organization_id(identity_url: &Url) -> String {
    identity_url.path().trim_start_matches('/').trim_end_matches('/').to_string()
}

async fn get_json<T: serde::de::DeserializeOwned>(
    transport: &Transport,
    method: Method,
    url: &str,
    prefix: &str,
    form: Option<&[(&str, &str)]>,
) -> Result<T, AuthError> {
    let mut request = transport
        .request(method, url, prefix)
        .map_err(|e| AuthError::Other(e.to_string()))?
        .header(reqwest::header::ACCEPT, "application/json");
    if let Some(form) = form {
        request = request.form(form);
    }

    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        return Err(AuthError::from_response(status.as_u16(), &body));
    }
    resp.json()
        .await
        .map_err(|e| AuthError::Other(format!("Unexpected response from {}: {}", url, e)))
}

/// Exchange credentials for a bearer token.
pub async fn login(
    transport: &Transport,
    url: &str,
    username: &str,
    password: &str,
) -> Result<Session, AuthError> {
    let base_url = normalize_url(url);
    if base_url.is_empty() {
        return Err(AuthError::Other("Platform URL is required".to_string()));
    }

    info!("Getting identity service info from {}", base_url);
    let info: IdentityServiceInfo = get_json(
        transport,
        Method::GET,
        &format!("{}/DocuWare/Platform/Home/IdentityServiceInfo", base_url),
        "",
        None,
    )
    .await?;
    let identity = Url::parse(&info.identity_service_url)
        .map_err(|e| AuthError::Other(format!("Invalid identity service URL: {}", e)))?;
    let organization_id = organization_id(&identity);
    debug!("Identity service: {} (organization {})", identity, organization_id);

    info!("Getting OpenID configuration");
    let discovery: OpenIdConfiguration = get_json(
        transport,
        Method::GET,
        &format!(
            "{}/.well-known/openid-configuration",
            identity.as_str().trim_end_matches('/')
        ),
        IDENTITY_PREFIX,
        None,
    )
    .await?;
    debug!("Token endpoint: {}", discovery.token_endpoint);

    info!("Requesting access token for {}", username);
    let token: TokenResponse = get_json(
        transport,
        Method::POST,
        &discovery.token_endpoint,
        IDENTITY_PREFIX,
        Some(&[
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
            ("client_id", CLIENT_ID),
            ("scope", SCOPE),
        ]),
    )
    .await?;

    info!("Authentication successful");
    Ok(Session {
        base_url,
        username: username.to_string(),
        token: token.access_token,
        organization_id,
    })
}
