//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod init;
pub mod run;
pub mod status;
pub mod validate;

use crate::adapters::postgresql::{PostgreSQLAdapter, PostgreSQLClient};
use crate::config::TabulaConfig;
use std::sync::Arc;

/// Connect to the platform database and make sure the job's tables exist
pub(crate) async fn connect_database(
    config: &TabulaConfig,
) -> crate::domain::Result<Arc<PostgreSQLAdapter>> {
    let client = PostgreSQLClient::new(config.postgresql.clone())?;
    client.ensure_schema().await?;
    Ok(Arc::new(PostgreSQLAdapter::new(client)))
}
