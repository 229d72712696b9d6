//! Unified error types for appforge

use thiserror::Error;

/// Unified error type for all appforge operations
#[derive(Error, Debug)]
pub enum AppforgeError {
    // Startup errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    // Request errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // Pipeline stage errors
    #[error("Code generation failed: {0}")]
    Generation(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Attachment error: {0}")]
    Attachment(String),

    // Remote API errors
    #[error("API error: {0}")]
    Api(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

/// Result type alias using AppforgeError
pub type Result<T> = std::result::Result<T, AppforgeError>;
