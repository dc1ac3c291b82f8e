//! In-memory platform implementation
//!
//! Implements every platform trait over plain in-process state. Hosts that
//! embed the job can seed it directly, and the test suite drives the full
//! export pipeline through it.

use crate::adapters::platform::{
    ActivityLogger, DataExportProvider, ExportFormat, ExportRequest, ProjectRegistry,
    SettingsStore,
};
use crate::core::plan::{EventFormMap, EVENT_NAME_COLUMN};
use crate::domain::ids::ProjectId;
use crate::domain::{DataDictionary, ProviderError, ProjectInfo, Result, TabulaError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Tabular record data for one project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTable {
    /// Column names
    pub columns: Vec<String>,

    /// Rows, each with one value per column
    pub rows: Vec<Vec<String>>,
}

impl RecordTable {
    /// Create a table from column names
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row
    pub fn with_row<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(values.into_iter().map(Into::into).collect());
        self
    }

    fn render(&self, request: &ExportRequest) -> Result<String> {
        let columns: Vec<String> = request
            .columns
            .clone()
            .unwrap_or_else(|| self.columns.clone());
        let indices: Vec<Option<usize>> = columns
            .iter()
            .map(|c| self.columns.iter().position(|own| own == c))
            .collect();
        let event_index = self.columns.iter().position(|c| c == EVENT_NAME_COLUMN);

        let rows = self.rows.iter().filter(|row| match (&request.events, event_index) {
            (Some(events), Some(idx)) => row
                .get(idx)
                .map(|value| events.iter().any(|e| e.as_str() == value))
                .unwrap_or(false),
            _ => true,
        });

        match request.format {
            ExportFormat::Csv => {
                let mut writer = csv::Writer::from_writer(Vec::new());
                writer.write_record(&columns)?;
                for row in rows {
                    let values: Vec<&str> = indices
                        .iter()
                        .map(|idx| idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or(""))
                        .collect();
                    writer.write_record(&values)?;
                }
                let bytes = writer
                    .into_inner()
                    .map_err(|e| TabulaError::Serialization(e.to_string()))?;
                String::from_utf8(bytes).map_err(|e| TabulaError::Serialization(e.to_string()))
            }
            ExportFormat::Json => {
                let records: Vec<serde_json::Map<String, serde_json::Value>> = rows
                    .map(|row| {
                        columns
                            .iter()
                            .zip(&indices)
                            .map(|(column, idx)| {
                                let value = idx.and_then(|i| row.get(i)).cloned().unwrap_or_default();
                                (column.clone(), serde_json::Value::String(value))
                            })
                            .collect()
                    })
                    .collect();
                Ok(serde_json::to_string(&records)?)
            }
        }
    }
}

/// A project as seen by the in-memory data export provider
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    /// Title and design
    pub info: ProjectInfo,

    /// Data dictionary
    pub dictionary: DataDictionary,

    /// Event -> forms mapping
    pub event_forms: EventFormMap,

    /// Record data
    pub records: RecordTable,
}

#[derive(Default)]
struct PlatformState {
    active_ids: Vec<ProjectId>,
    registry_error: Option<String>,
    projects: HashMap<ProjectId, ProjectFixture>,
    failing_projects: Vec<ProjectId>,
    system_settings: HashMap<String, String>,
    project_settings: HashMap<(ProjectId, String), String>,
    activity: Vec<(String, Option<ProjectId>)>,
    requests: Vec<(ProjectId, ExportRequest)>,
}

/// In-memory platform implementing every collaborator trait
#[derive(Default)]
pub struct InMemoryPlatform {
    state: Mutex<PlatformState>,
}

impl InMemoryPlatform {
    /// Create an empty platform
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PlatformState> {
        // A poisoned lock only means a test panicked mid-update; the data is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a project and list it as active
    pub fn add_project(&self, project_id: ProjectId, fixture: ProjectFixture) {
        let mut state = self.state();
        if !state.active_ids.contains(&project_id) {
            state.active_ids.push(project_id.clone());
        }
        state.projects.insert(project_id, fixture);
    }

    /// Make the registry query fail
    pub fn fail_registry(&self, message: impl Into<String>) {
        self.state().registry_error = Some(message.into());
    }

    /// Make every provider call for a project fail
    pub fn fail_provider_for(&self, project_id: ProjectId) {
        self.state().failing_projects.push(project_id);
    }

    /// Set a system-level setting
    pub fn set_system(&self, key: &str, value: &str) {
        self.state()
            .system_settings
            .insert(key.to_string(), value.to_string());
    }

    /// Set a project-level setting
    pub fn set_project(&self, project_id: &ProjectId, key: &str, value: &str) {
        self.state()
            .project_settings
            .insert((project_id.clone(), key.to_string()), value.to_string());
    }

    /// Current value of a system-level setting
    pub fn system_value(&self, key: &str) -> Option<String> {
        self.state().system_settings.get(key).cloned()
    }

    /// Activity log entries recorded so far
    pub fn activity(&self) -> Vec<(String, Option<ProjectId>)> {
        self.state().activity.clone()
    }

    /// Export requests received so far
    pub fn requests(&self) -> Vec<(ProjectId, ExportRequest)> {
        self.state().requests.clone()
    }

    fn fixture(&self, project_id: &ProjectId) -> Result<ProjectFixture> {
        let state = self.state();
        if state.failing_projects.contains(project_id) {
            return Err(ProviderError::ServerError {
                status: 500,
                message: format!("export failed for project {project_id}"),
            }
            .into());
        }
        state
            .projects
            .get(project_id)
            .cloned()
            .ok_or_else(|| ProviderError::ProjectNotFound(project_id.to_string()).into())
    }
}

#[async_trait]
impl ProjectRegistry for InMemoryPlatform {
    async fn list_active_project_ids(&self) -> Result<Vec<ProjectId>> {
        let state = self.state();
        if let Some(message) = &state.registry_error {
            return Err(TabulaError::Registry(message.clone()));
        }
        Ok(state.active_ids.clone())
    }
}

#[async_trait]
impl DataExportProvider for InMemoryPlatform {
    async fn project_info(&self, project_id: &ProjectId) -> Result<ProjectInfo> {
        Ok(self.fixture(project_id)?.info)
    }

    async fn data_dictionary(&self, project_id: &ProjectId) -> Result<DataDictionary> {
        Ok(self.fixture(project_id)?.dictionary)
    }

    async fn event_form_map(&self, project_id: &ProjectId) -> Result<EventFormMap> {
        Ok(self.fixture(project_id)?.event_forms)
    }

    async fn export_records(
        &self,
        project_id: &ProjectId,
        request: &ExportRequest,
    ) -> Result<String> {
        let fixture = self.fixture(project_id)?;
        self.state()
            .requests
            .push((project_id.clone(), request.clone()));
        fixture.records.render(request)
    }
}

#[async_trait]
impl SettingsStore for InMemoryPlatform {
    async fn system_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self.system_value(key))
    }

    async fn project_setting(&self, project_id: &ProjectId, key: &str) -> Result<Option<String>> {
        Ok(self
            .state()
            .project_settings
            .get(&(project_id.clone(), key.to_string()))
            .cloned())
    }

    async fn set_system_setting(&self, key: &str, value: &str) -> Result<()> {
        self.set_system(key, value);
        Ok(())
    }
}

#[async_trait]
impl ActivityLogger for InMemoryPlatform {
    async fn log_event(&self, description: &str, project_id: Option<&ProjectId>) {
        self.state()
            .activity
            .push((description.to_string(), project_id.cloned()));
    }
}
