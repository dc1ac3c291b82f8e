//! Export summary and reporting
//!
//! Counters and per-project reports for one run. The run log is the
//! operator document; the summary is what the CLI prints and what embedding
//! hosts inspect.

use crate::core::export::sink::WrittenFile;
use crate::domain::ids::ProjectId;
use serde::Serialize;
use std::time::Duration;

/// Files produced for one project
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    /// Project id
    pub project_id: ProjectId,

    /// Project title
    pub title: String,

    /// Folder name under the output root
    pub folder: String,

    /// Whether PHI fields were exported
    pub phi_included: bool,

    /// Files written, data files first, readme last
    pub files: Vec<WrittenFile>,

    /// Forms skipped because no event collects them
    pub forms_without_events: Vec<String>,
}

/// Summary of an export run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    /// Projects returned by the registry
    pub projects_total: usize,

    /// Projects exported
    pub projects_exported: usize,

    /// Projects skipped because their export is disabled
    pub projects_disabled: usize,

    /// Total number of files written
    pub files_written: usize,

    /// Duration of the run
    pub duration: Duration,

    /// Per-project reports, in export order
    pub projects: Vec<ProjectReport>,

    /// Expected failures encountered during the run
    pub errors: Vec<ExportError>,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add an error
    pub fn add_error(&mut self, error: ExportError) {
        self.errors.push(error);
    }

    /// Record an exported project
    pub fn add_project(&mut self, report: ProjectReport) {
        self.projects_exported += 1;
        self.files_written += report.files.len();
        self.projects.push(report);
    }

    /// Project already exported into `folder` during this run
    pub fn folder_owner(&self, folder: &str) -> Option<&ProjectId> {
        self.projects
            .iter()
            .find(|p| p.folder == folder)
            .map(|p| &p.project_id)
    }

    /// Projects skipped because their folder could not be created
    pub fn directory_failures(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.error_type == ExportErrorType::Directory)
            .count()
    }

    /// Check if the run hit no expected failures
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            projects_total = self.projects_total,
            projects_exported = self.projects_exported,
            projects_disabled = self.projects_disabled,
            files_written = self.files_written,
            duration_secs = self.duration.as_secs(),
            "Export summary"
        );

        if !self.errors.is_empty() {
            tracing::warn!(error_count = self.errors.len(), "Export completed with errors");
            for error in &self.errors {
                tracing::warn!(
                    error_type = ?error.error_type,
                    message = %error.message,
                    context = ?error.context,
                    "Export error"
                );
            }
        }
    }
}

/// Type of export error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExportErrorType {
    /// Project registry could not be queried
    Registry,
    /// Project folder could not be created
    Directory,
}

/// Export error with context
#[derive(Debug, Clone, Serialize)]
pub struct ExportError {
    /// Type of error
    pub error_type: ExportErrorType,

    /// Error message
    pub message: String,

    /// Optional context (e.g. project id)
    pub context: Option<String>,
}

impl ExportError {
    /// Create a new export error
    pub fn new(error_type: ExportErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            context: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: &str, files: usize) -> ProjectReport {
        ProjectReport {
            project_id: ProjectId::new(id).unwrap(),
            title: format!("Project {id}"),
            folder: id.to_string(),
            phi_included: false,
            files: (0..files)
                .map(|i| WrittenFile {
                    name: format!("f{i}.csv"),
                    bytes: 0,
                    sha256: String::new(),
                })
                .collect(),
            forms_without_events: Vec::new(),
        }
    }

    #[test]
    fn test_export_summary_creation() {
        let summary = ExportSummary::new();

        assert_eq!(summary.projects_total, 0);
        assert_eq!(summary.projects_exported, 0);
        assert_eq!(summary.files_written, 0);
        assert_eq!(summary.duration, Duration::from_secs(0));
        assert!(summary.is_successful());
    }

    #[test]
    fn test_export_summary_with_duration() {
        let summary = ExportSummary::new().with_duration(Duration::from_secs(120));
        assert_eq!(summary.duration, Duration::from_secs(120));
    }

    #[test]
    fn test_folder_owner() {
        let mut summary = ExportSummary::new();
        summary.add_project(report("12", 1));

        assert_eq!(summary.folder_owner("12").map(|id| id.as_str()), Some("12"));
        assert!(summary.folder_owner("13").is_none());
    }

    #[test]
    fn test_add_project_counts_files() {
        let mut summary = ExportSummary::new();
        summary.add_project(report("1", 4));
        summary.add_project(report("2", 3));

        assert_eq!(summary.projects_exported, 2);
        assert_eq!(summary.files_written, 7);
        assert_eq!(summary.projects[1].project_id.as_str(), "2");
    }

    #[test]
    fn test_directory_failures() {
        let mut summary = ExportSummary::new();
        summary.add_error(
            ExportError::new(ExportErrorType::Directory, "Unable to make directory".to_string())
                .with_context("project_id=12".to_string()),
        );
        summary.add_error(ExportError::new(
            ExportErrorType::Registry,
            "connection refused".to_string(),
        ));

        assert_eq!(summary.directory_failures(), 1);
        assert!(!summary.is_successful());
        assert_eq!(summary.errors[0].context.as_deref(), Some("project_id=12"));
    }
}
