//! Error taxonomy for the SPYPOINT client.
//!
//! Only transport and authentication problems surface here. Normalization
//! never fails; missing or malformed vendor fields degrade to defaults.

use reqwest::StatusCode;

/// Result type alias
pub type Result<T> = std::result::Result<T, SpypointError>;

/// Errors returned by [`crate::data_sources::SpypointClient`].
#[derive(Debug, thiserror::Error)]
pub enum SpypointError {
    /// The login endpoint rejected the credentials (HTTP 401).
    #[error("Invalid SPYPOINT credentials")]
    InvalidCredentials,

    /// The login endpoint answered with any other non-success status.
    #[error("Authentication failed: {status}")]
    AuthenticationFailed { status: StatusCode },

    /// An authorized call was made before a successful login.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// A camera or photo fetch answered with a non-success status.
    #[error("Failed to fetch {resource}: {status}")]
    FetchFailed {
        resource: &'static str,
        status: StatusCode,
    },

    /// The response body did not have the expected JSON shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Network-level failure while talking to the vendor.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl SpypointError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SpypointError::InvalidCredentials => Some(StatusCode::UNAUTHORIZED),
            SpypointError::AuthenticationFailed { status }
            | SpypointError::FetchFailed { status, .. } => Some(*status),
            SpypointError::Transport(e) => e.status(),
            SpypointError::NotAuthenticated | SpypointError::MalformedResponse(_) => None,
        }
    }
}
