//! Configuration management for Tabula.
//!
//! Two layers of configuration feed a run:
//!
//! - [`TabulaConfig`]: deployment settings from `tabula.toml` (database,
//!   data export API, logging), with `${VAR}` substitution and `TABULA_*`
//!   environment overrides
//! - [`JobSettings`] / [`ProjectSettings`]: operator switches read from the
//!   platform settings store at the start of every run
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//!
//! [application]
//! log_level = "info"
//! job_description = "Export Data Files"
//!
//! [postgresql]
//! connection_string = "${TABULA_DATABASE_URL}"
//!
//! [provider]
//! base_url = "https://redcap.example.org/api/"
//!
//! [provider.tokens]
//! "12" = "${TABULA_TOKEN_12}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;
pub mod settings;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, Environment, LoggingConfig, PostgreSQLConfig, ProviderConfig,
    TabulaConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
pub use settings::{
    keys, parse_flag, AllDataColumns, FolderNaming, JobSettings, ProjectSettings,
    LOG_SAMPLE_LIMIT,
};
