//! Error types for parley-api

use thiserror::Error;

/// Result type alias using parley-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when calling the completion endpoint
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response. Carries the server-supplied message,
    /// or a generic one when the body held none.
    #[error("{message}")]
    Api { message: String },

    /// Unexpected response format
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Create an API error from a message
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }
}
