//! Error types for the directory client
//!
//! Distinguishes transient failures, which the retry policy re-attempts,
//! from permanent ones that surface immediately.

use thiserror::Error;

/// Errors that can occur when talking to the VPN directory
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned a non-success response
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse the API response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The access token was rejected
    #[error("Not authenticated - check the access token passed to `xray-gen fetch-key`")]
    Unauthorized,

    /// Rate limit exceeded
    #[error("Rate limit exceeded - please try again later")]
    RateLimited,

    /// Server error
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Every attempt allowed by the retry policy failed
    #[error("Directory unavailable after {attempts} attempts: {source}")]
    Unavailable {
        attempts: u32,
        source: Box<DirectoryError>,
    },
}

impl DirectoryError {
    /// Whether a retry has a chance of succeeding
    pub fn is_transient(&self) -> bool {
        match self {
            DirectoryError::HttpError(e) => !e.is_builder(),
            DirectoryError::ApiError { .. }
            | DirectoryError::RateLimited
            | DirectoryError::ServerError { .. } => true,
            DirectoryError::ParseError(_)
            | DirectoryError::Unauthorized
            | DirectoryError::Unavailable { .. } => false,
        }
    }
}

/// Result type alias for directory operations
pub type Result<T> = std::result::Result<T, DirectoryError>;
