//! Error context extension trait
//!
//! A `.context()` / `.with_context()` pair for `Result<T, TabulaError>`,
//! mirroring `anyhow::Context` while keeping the library on its own error type.
//!
//! # Examples
//!
//! ```rust
//! use tabula::domain::Result;
//! use tabula::domain::context::ResultExt;
//!
//! fn read_header(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_context(|| format!("Failed to read export file: {}", path))
//! }
//! ```

use crate::domain::errors::TabulaError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error (evaluated eagerly)
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error, computing it only on failure
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<TabulaError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| wrap(e.into(), context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

/// Prefix the message while keeping I/O errors classified as I/O.
fn wrap(base: TabulaError, context: impl std::fmt::Display) -> TabulaError {
    match base {
        TabulaError::Io(message) => TabulaError::Io(format!("{context}: {message}")),
        other => TabulaError::Other(format!("{context}: {other}")),
    }
}
