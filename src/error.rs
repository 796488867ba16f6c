use axum::http::StatusCode;

/// Problems found while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Failures of the OAuth2 token endpoint or of the authorization round trip.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token endpoint could not be reached or its response was unreadable.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint answered with an OAuth2 error body.
    #[error("{error}: {description}")]
    Provider { error: String, description: String },

    /// The user (or Spotify) aborted the authorization and sent `?error=` back.
    #[error("authorization denied: {0}")]
    Denied(String),
}

impl AuthError {
    /// HTTP status used when this error ends up on an error page.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Provider { .. } | Self::Denied(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Failures of a Spotify Web API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with the message from Spotify's regular error object.
    #[error("Spotify returned {status}: {message}")]
    Status { status: u16, message: String },
}
