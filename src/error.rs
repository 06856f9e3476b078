//! RealTrust Error Types
//!
//! Centralized error handling for the library and the function endpoints.

use thiserror::Error;

/// Central error type for RealTrust
#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Captcha verification error: {0}")]
    Captcha(String),

    #[error("Email delivery error: {0}")]
    Email(String),

    #[error("Push delivery error: {0}")]
    Push(String),

    #[error("Places lookup error: {0}")]
    Places(String),

    #[error("Voice token error: {0}")]
    Voice(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for RealTrust operations
pub type SiteResult<T> = Result<T, SiteError>;
