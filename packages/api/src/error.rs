//! Error types for the Matcha REST client.

use thiserror::Error;

/// Errors returned by [`crate::ApiClient`] calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be decoded as the expected type.
    #[error("deserialization error: {0}")]
    Deserialize(String),

    /// The payload failed local form validation; no request was sent.
    #[error("validation error: {0}")]
    Validation(String),
}

impl ApiError {
    /// A message suitable for showing directly to the user.
    ///
    /// Prefers the server-provided body (the backend returns plain error
    /// strings for 4xx responses); network and decode failures collapse
    /// into a generic retry hint.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { body, .. } if !body.trim().is_empty() => body.trim().to_string(),
            ApiError::Http { status, .. } => format!("Request failed (HTTP {})", status),
            ApiError::Validation(message) => message.clone(),
            ApiError::Network(_) | ApiError::Deserialize(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}
