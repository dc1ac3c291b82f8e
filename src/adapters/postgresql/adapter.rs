//! PostgreSQL adapter implementing the platform registry, settings and
//! activity log traits

use crate::adapters::platform::{ActivityLogger, ProjectRegistry, SettingsStore};
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::domain::ids::ProjectId;
use crate::domain::{Result, TabulaError};
use async_trait::async_trait;
use std::sync::Arc;

/// Settings rows with this project id hold system-level values
const SYSTEM_SCOPE: &str = "";

/// PostgreSQL implementation of the platform traits
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    /// Create a new PostgreSQL adapter
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }

    async fn read_setting(&self, scope: &str, key: &str) -> Result<Option<String>> {
        let sql = select_setting_sql(&self.client.config().settings_table);
        let rows = self
            .client
            .query(&sql, &[&scope, &key])
            .await
            .map_err(|e| TabulaError::Settings(format!("Failed to read setting '{key}': {e}")))?;

        rows.first()
            .map(|row| row.try_get::<_, Option<String>>(0))
            .transpose()
            .map(Option::flatten)
            .map_err(|e| TabulaError::Settings(format!("Invalid value for setting '{key}': {e}")))
    }
}

fn registry_sql(projects_table: &str) -> String {
    format!(
        "SELECT project_id::text FROM {projects_table} \
         WHERE status IN (1, 2) \
         AND project_name NOT LIKE $1 \
         AND completed_time IS NULL \
         ORDER BY project_id"
    )
}

fn select_setting_sql(settings_table: &str) -> String {
    format!("SELECT value FROM {settings_table} WHERE project_id = $1 AND key = $2")
}

fn upsert_setting_sql(settings_table: &str) -> String {
    format!(
        "INSERT INTO {settings_table} (project_id, key, value, updated_at) \
         VALUES ($1, $2, $3, NOW()) \
         ON CONFLICT (project_id, key) \
         DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()"
    )
}

fn insert_activity_sql(activity_table: &str) -> String {
    format!("INSERT INTO {activity_table} (project_id, description) VALUES ($1, $2)")
}

#[async_trait]
impl ProjectRegistry for PostgreSQLAdapter {
    async fn list_active_project_ids(&self) -> Result<Vec<ProjectId>> {
        let config = self.client.config();
        let rows = self
            .client
            .query(
                &registry_sql(&config.projects_table),
                &[&config.demo_project_pattern],
            )
            .await
            .map_err(|e| TabulaError::Registry(e.to_string()))?;

        let mut project_ids = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row
                .try_get(0)
                .map_err(|e| TabulaError::Registry(format!("Invalid project id column: {e}")))?;
            project_ids.push(ProjectId::new(raw).map_err(TabulaError::Registry)?);
        }

        tracing::debug!(count = project_ids.len(), "Listed active projects");
        Ok(project_ids)
    }
}

#[async_trait]
impl SettingsStore for PostgreSQLAdapter {
    async fn system_setting(&self, key: &str) -> Result<Option<String>> {
        self.read_setting(SYSTEM_SCOPE, key).await
    }

    async fn project_setting(&self, project_id: &ProjectId, key: &str) -> Result<Option<String>> {
        self.read_setting(project_id.as_str(), key).await
    }

    async fn set_system_setting(&self, key: &str, value: &str) -> Result<()> {
        let sql = upsert_setting_sql(&self.client.config().settings_table);
        self.client
            .execute(&sql, &[&SYSTEM_SCOPE, &key, &value])
            .await
            .map_err(|e| TabulaError::Settings(format!("Failed to write setting '{key}': {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl ActivityLogger for PostgreSQLAdapter {
    async fn log_event(&self, description: &str, project_id: Option<&ProjectId>) {
        let sql = insert_activity_sql(&self.client.config().activity_table);
        let project_id = project_id.map(ProjectId::as_str);
        if let Err(e) = self.client.execute(&sql, &[&project_id, &description]).await {
            tracing::warn!(
                error = %e,
                description = description,
                "Failed to write activity log entry"
            );
        }
    }
}
