//! Data export API integration
//!
//! Implements [`crate::adapters::platform::DataExportProvider`] over the
//! platform's token-authenticated HTTP API.

pub mod client;
pub mod models;

pub use client::ApiExportProvider;
pub use models::CLASSIC_EVENT_NAME;
