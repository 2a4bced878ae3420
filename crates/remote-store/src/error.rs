//! Error types for the remote store crate.

use thiserror::Error;

/// Result type alias for remote store operations.
pub type Result<T> = std::result::Result<T, RemoteStoreError>;

/// Errors that can occur while talking to the remote store.
#[derive(Debug, Error)]
pub enum RemoteStoreError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error response from the remote store
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Credential rejected by the remote store
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Endpoint or credential unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RemoteStoreError {
    /// Create an API error from status and message. 401 and 403 become auth errors.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => Self::Auth(format!("{} ({})", message.into(), status)),
            _ => Self::Api {
                status,
                message: message.into(),
            },
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<RemoteStoreError> for boracrm_core::Error {
    fn from(err: RemoteStoreError) -> Self {
        boracrm_core::Error::remote(err.to_string())
    }
}
