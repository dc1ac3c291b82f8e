//! Platform collaborator traits
//!
//! The export job runs inside a host platform that owns projects, settings,
//! the activity log and the data export API. These traits are the seams
//! through which the job talks to it; adapters implement them for concrete
//! backends.

use crate::core::plan::EventFormMap;
use crate::domain::ids::{EventId, ProjectId};
use crate::domain::{DataDictionary, ProjectInfo, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output format requested from the data export provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values with a header row
    #[default]
    Csv,
    /// JSON array of flat records
    Json,
}

impl ExportFormat {
    /// Wire name of the format
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A records export request
///
/// `None` for columns or events means "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRequest {
    /// Output format
    pub format: ExportFormat,

    /// Optional record filter expression in the platform's logic syntax
    pub filter_logic: Option<String>,

    /// Columns to export
    pub columns: Option<Vec<String>>,

    /// Events whose rows are exported
    pub events: Option<Vec<EventId>>,
}

impl ExportRequest {
    /// An unrestricted CSV export
    pub fn csv() -> Self {
        Self::default()
    }

    /// Restrict the export to the given columns
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Restrict the export to rows of the given events
    pub fn with_events(mut self, events: Vec<EventId>) -> Self {
        self.events = Some(events);
        self
    }

    /// Restrict the export to records matching a filter expression
    pub fn with_filter_logic(mut self, logic: impl Into<String>) -> Self {
        self.filter_logic = Some(logic.into());
        self
    }
}

/// Registry of the platform's projects
#[async_trait]
pub trait ProjectRegistry: Send + Sync {
    /// Ids of projects eligible for export, in a stable order
    ///
    /// Eligible projects are in an active or analysis state, are not demo
    /// projects, and have not been marked completed. An empty list is a
    /// valid answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be queried.
    async fn list_active_project_ids(&self) -> Result<Vec<ProjectId>>;
}

/// The platform's data export API
#[async_trait]
pub trait DataExportProvider: Send + Sync {
    /// Title and design of a project
    async fn project_info(&self, project_id: &ProjectId) -> Result<ProjectInfo>;

    /// Ordered data dictionary of a project
    async fn data_dictionary(&self, project_id: &ProjectId) -> Result<DataDictionary>;

    /// Event -> forms mapping of a project
    ///
    /// Classic (non-longitudinal) projects report a single event that
    /// collects every form.
    async fn event_form_map(&self, project_id: &ProjectId) -> Result<EventFormMap>;

    /// Export record data
    async fn export_records(&self, project_id: &ProjectId, request: &ExportRequest)
        -> Result<String>;
}

/// Named system-level and project-level settings
///
/// Values are stored as strings; typed parsing happens in
/// [`crate::config::JobSettings`].
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a system-level setting
    async fn system_setting(&self, key: &str) -> Result<Option<String>>;

    /// Read a project-level setting
    async fn project_setting(&self, project_id: &ProjectId, key: &str) -> Result<Option<String>>;

    /// Write a system-level setting
    async fn set_system_setting(&self, key: &str, value: &str) -> Result<()>;
}

/// The platform's activity (audit) log
///
/// Logging is fire-and-forget: implementations report their own failures
/// through tracing and never fail the caller.
#[async_trait]
pub trait ActivityLogger: Send + Sync {
    /// Record an event, optionally attributed to a project
    async fn log_event(&self, description: &str, project_id: Option<&ProjectId>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_request_builder() {
        let request = ExportRequest::csv()
            .with_columns(vec!["id".to_string(), "age".to_string()])
            .with_events(vec![EventId::new("event_1").unwrap()])
            .with_filter_logic("[age] > 18");

        assert_eq!(request.format, ExportFormat::Csv);
        assert_eq!(request.columns.as_ref().unwrap().len(), 2);
        assert_eq!(request.events.as_ref().unwrap()[0].as_str(), "event_1");
        assert_eq!(request.filter_logic.as_deref(), Some("[age] > 18"));
    }

    #[test]
    fn test_unrestricted_request() {
        let request = ExportRequest::csv();
        assert!(request.columns.is_none());
        assert!(request.events.is_none());
        assert!(request.filter_logic.is_none());
    }

    #[test]
    fn test_export_format_names() {
        assert_eq!(ExportFormat::Csv.to_string(), "csv");
        assert_eq!(ExportFormat::Json.as_str(), "json");
    }
}
