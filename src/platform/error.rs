//! Error types for the document platform client.

use thiserror::Error;

/// Errors from Remote Gateway calls.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Platform returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("No search dialog found for cabinet {0}")]
    NoSearchDialog(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Document {0} has no content section")]
    NoSection(String),
}

impl PlatformError {
    /// HTTP status, when the platform answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// Login failures, each with its own user-facing message.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Login Failed (400): {0}")]
    LoginFailed(String),

    #[error("Unauthorized. Please verify your credentials.")]
    Unauthorized,

    #[error("Service not found. Please check your Platform URL.")]
    ServiceNotFound,

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Cannot reach the document platform. Please check your URL and internet connection.")]
    Unreachable,

    #[error("{0}")]
    Other(String),
}

impl AuthError {
    /// Map an HTTP error status and its JSON body to a login failure.
    pub fn from_response(status: u16, body: &serde_json::Value) -> Self {
        let detail = body
            .get("error_description")
            .or_else(|| body.get("error"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        match status {
            400 => Self::LoginFailed(
                detail.unwrap_or_else(|| "Invalid credentials or bad request".to_string()),
            ),
            401 => Self::Unauthorized,
            404 => Self::ServiceNotFound,
            _ => Self::Server {
                status,
                message: detail.unwrap_or_else(|| "Unknown error".to_string()),
            },
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() || e.is_request() {
            Self::Unreachable
        } else {
            Self::Other(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_error_mapping() {
        let err = AuthError::from_response(
            400,
            &json!({"error": "invalid_grant", "error_description": "Bad password"}),
        );
        assert_eq!(err.to_string(), "Login Failed (400): Bad password");

        let err = AuthError::from_response(400, &json!({"error": "invalid_request"}));
        assert_eq!(err.to_string(), "Login Failed (400): invalid_request");

        assert!(matches!(
            AuthError::from_response(401, &json!({})),
            AuthError::Unauthorized
        ));
        assert!(matches!(
            AuthError::from_response(404, &json!(null)),
            AuthError::ServiceNotFound
        ));
        assert_eq!(
            AuthError::from_response(503, &json!({})).to_string(),
            "Server error (503): Unknown error"
        );
    }

    #[test]
    fn test_platform_error_status() {
        let err = PlatformError::Status {
            status: 404,
            message: "gone".into(),
        };
        assert!(err.is_not_found());
        assert!(!PlatformError::NoSearchDialog("c".into()).is_not_found());
    }
}
