//! Shared "current project" selection
//!
//! The export pipeline passes project ids explicitly. Some hosts also keep a
//! process-wide notion of the selected project; [`CurrentProject`] is that
//! handle, and [`ProjectScope`] changes it for a bounded region, putting the
//! previous value back on drop (including early returns and `?`).

use crate::domain::ids::ProjectId;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared, cloneable handle to the selected project
#[derive(Debug, Clone, Default)]
pub struct CurrentProject {
    inner: Arc<Mutex<Option<ProjectId>>>,
}

impl CurrentProject {
    /// Handle with no project selected
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle with `project_id` selected
    pub fn with_project(project_id: ProjectId) -> Self {
        let handle = Self::new();
        handle.set(Some(project_id));
        handle
    }

    fn lock(&self) -> MutexGuard<'_, Option<ProjectId>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Currently selected project
    pub fn get(&self) -> Option<ProjectId> {
        self.lock().clone()
    }

    /// Replace the selection, returning the previous value
    pub fn set(&self, project_id: Option<ProjectId>) -> Option<ProjectId> {
        std::mem::replace(&mut *self.lock(), project_id)
    }

    /// Open a scope that restores the current value when dropped
    pub fn scope(&self) -> ProjectScope {
        ProjectScope {
            handle: self.clone(),
            previous: self.get(),
        }
    }

    /// Open a scope with `project_id` selected
    pub fn enter(&self, project_id: ProjectId) -> ProjectScope {
        let previous = self.set(Some(project_id));
        ProjectScope {
            handle: self.clone(),
            previous,
        }
    }
}

/// Guard restoring a [`CurrentProject`] on drop
#[must_use = "the previous project is restored as soon as the scope is dropped"]
#[derive(Debug)]
pub struct ProjectScope {
    handle: CurrentProject,
    previous: Option<ProjectId>,
}

impl ProjectScope {
    /// Change the selection inside this scope
    pub fn select(&self, project_id: ProjectId) {
        self.handle.set(Some(project_id));
    }

    /// Value that will be restored
    pub fn previous(&self) -> Option<&ProjectId> {
        self.previous.as_ref()
    }
}

impl Drop for ProjectScope {
    fn drop(&mut self) {
        self.handle.set(self.previous.take());
    }
}
