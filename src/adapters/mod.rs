//! External system integrations for Tabula.
//!
//! - [`platform`] - Collaborator traits the export job is written against
//! - [`postgresql`] - Project registry, settings store and activity log on
//!   the platform database
//! - [`api`] - Data export provider over the platform's HTTP API
//! - [`memory`] - In-memory implementation of every trait, for tests and
//!   embedding hosts
//!
//! # Wiring
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tabula::adapters::api::ApiExportProvider;
//! use tabula::adapters::postgresql::{PostgreSQLAdapter, PostgreSQLClient};
//! use tabula::config::load_config;
//! use tabula::core::export::ExportCoordinator;
//!
//! # fn example() -> tabula::domain::Result<()> {
//! let config = load_config("tabula.toml")?;
//! let database = Arc::new(PostgreSQLAdapter::new(PostgreSQLClient::new(
//!     config.postgresql.clone(),
//! )?));
//! let provider = Arc::new(ApiExportProvider::new(&config.provider)?);
//!
//! let coordinator =
//!     ExportCoordinator::new(database.clone(), provider, database.clone(), database);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod memory;
pub mod platform;
pub mod postgresql;
