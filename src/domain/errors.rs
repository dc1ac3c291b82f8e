//! Domain error types
//!
//! This module defines the error hierarchy for Tabula. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Tabula error type
///
/// This is the primary error type used throughout the application.
/// Expected run conditions (disabled system, missing output directory, empty
/// project list) are never errors; they are reported through
/// [`crate::core::export::RunOutcome`].
#[derive(Debug, Error)]
pub enum TabulaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Data export provider errors
    #[error("Data export provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Project registry errors
    #[error("Project registry error: {0}")]
    Registry(String),

    /// Settings store errors
    #[error("Settings store error: {0}")]
    Settings(String),

    /// Platform database errors
    #[error("Database error: {0}")]
    Database(String),

    /// Malformed project metadata (dictionary, event mapping)
    #[error("Invalid project metadata: {0}")]
    Metadata(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Data export provider errors
///
/// Errors that occur when talking to the platform's data export API.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Failed to connect to the export API
    #[error("Failed to connect to export API: {0}")]
    ConnectionFailed(String),

    /// No API token is configured for the project
    #[error("No API token configured for project {0}")]
    MissingToken(String),

    /// Invalid response from the API
    #[error("Invalid response from export API: {0}")]
    InvalidResponse(String),

    /// Project not known to the provider
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for TabulaError {
    fn from(err: std::io::Error) -> Self {
        TabulaError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for TabulaError {
    fn from(err: serde_json::Error) -> Self {
        TabulaError::Serialization(err.to_string())
    }
}

// Conversion from csv::Error
impl From<csv::Error> for TabulaError {
    fn from(err: csv::Error) -> Self {
        TabulaError::Serialization(format!("CSV error: {err}"))
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for TabulaError {
    fn from(err: toml::de::Error) -> Self {
        TabulaError::Configuration(format!("TOML parse error: {err}"))
    }
}
