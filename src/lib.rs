// Tabula - Scheduled per-project CSV export
// Copyright (c) 2025 Tabula Contributors
// Licensed under the MIT License

//! # Tabula - Scheduled per-project CSV export
//!
//! Tabula is a batch job for clinical data capture platforms. On every run it
//! walks the platform's production projects and writes, per project, a folder
//! of CSV files under a configured root: one file with all data, one file per
//! form holding that form's fields for the events that collect it, the data
//! dictionary, and a readme.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Column planning, event resolution, the export pass itself
//! - [`adapters`] - Platform integrations (PostgreSQL, HTTP export API, in-memory)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration file and per-run job settings
//! - [`logging`] - Structured logging and the operator-facing run log
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tabula::adapters::memory::InMemoryPlatform;
//! use tabula::core::export::{ExportCoordinator, JobContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let platform = Arc::new(InMemoryPlatform::new());
//!     platform.set_system("system-enabled", "1");
//!     platform.set_system("root-dir", "/srv/exports");
//!
//!     let coordinator = ExportCoordinator::from_platform(platform);
//!     let report = coordinator.execute(&JobContext::new("Export Data Files")).await?;
//!
//!     println!("{}", report.outcome);
//!     println!("Wrote {} files", report.summary.files_written);
//!     Ok(())
//! }
//! ```
//!
//! ## PHI
//!
//! Fields flagged as identifiers in the data dictionary are left out unless
//! both the system-level and the project-level `include-phi` settings are on.
//! The record id column and the repeat columns are always exported.
//!
//! ## Error Handling
//!
//! Expected conditions (job disabled, output root missing, registry down) are
//! reported as a [`core::export::RunOutcome`]. Everything else is a
//! [`domain::TabulaError`]:
//!
//! ```rust,no_run
//! use tabula::domain::TabulaError;
//!
//! fn example() -> Result<(), TabulaError> {
//!     let config = tabula::config::load_config("tabula.toml")?;
//!     println!("{}", config.provider.base_url);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
