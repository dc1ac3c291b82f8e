//! Project domain model
//!
//! A project is owned and persisted by the platform; the export job only
//! reads it. Its metadata comes from two places: the data export provider
//! (title, longitudinal design) and the project-level settings (PHI opt-in,
//! export enabled).

use super::ids::ProjectId;
use serde::{Deserialize, Serialize};

/// Project metadata as reported by the data export provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Display title
    pub title: String,

    /// Whether records are organized into named events
    pub longitudinal: bool,
}

impl ProjectInfo {
    /// Create project metadata
    pub fn new(title: impl Into<String>, longitudinal: bool) -> Self {
        Self {
            title: title.into(),
            longitudinal,
        }
    }
}

/// A project selected for export
///
/// # Examples
///
/// ```
/// use tabula::domain::{Project, ProjectId, ProjectInfo};
///
/// let project = Project::new(
///     ProjectId::new("12").unwrap(),
///     ProjectInfo::new("Cardiology Registry", true),
/// )
/// .with_include_phi(true);
///
/// assert!(project.longitudinal);
/// assert!(project.include_phi);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Platform identifier
    pub id: ProjectId,

    /// Display title
    pub title: String,

    /// Whether records are organized into named events
    pub longitudinal: bool,

    /// Project-level opt-in for exporting PHI fields
    pub include_phi: bool,

    /// Project-level switch for this export job
    pub enabled: bool,
}

impl Project {
    /// Build a project from provider metadata, with PHI excluded and the
    /// export enabled
    pub fn new(id: ProjectId, info: ProjectInfo) -> Self {
        Self {
            id,
            title: info.title,
            longitudinal: info.longitudinal,
            include_phi: false,
            enabled: true,
        }
    }

    /// Set the project-level PHI opt-in
    pub fn with_include_phi(mut self, include_phi: bool) -> Self {
        self.include_phi = include_phi;
        self
    }

    /// Set the project-level export switch
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
