//! Run inputs and results

use crate::core::export::summary::ExportSummary;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Per-run inputs supplied by the scheduler
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Job description, echoed in the completion message
    pub description: String,

    /// Plan and resolve everything but write no files
    pub dry_run: bool,

    /// Identifier of this run
    pub run_id: Uuid,
}

impl JobContext {
    /// Create a context for one run
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            dry_run: false,
            run_id: Uuid::new_v4(),
        }
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Human-readable result of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// The job is switched off
    Disabled,
    /// The output root is missing or not a directory
    DirectoryUnavailable,
    /// The project registry could not be queried
    NoProjectIds,
    /// The pass over all projects finished
    Completed {
        /// Job description
        description: String,
    },
}

impl RunOutcome {
    /// True when the run went through the project list
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Disabled => write!(f, "Disabled."),
            RunOutcome::DirectoryUnavailable => write!(f, "The export directory is not available."),
            RunOutcome::NoProjectIds => write!(f, "No project IDs."),
            RunOutcome::Completed { description } => {
                write!(f, "The \"{description}\" cron job completed successfully.")
            }
        }
    }
}

/// Outcome plus counters of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Result message
    pub outcome: RunOutcome,

    /// Counters and per-project reports
    pub summary: ExportSummary,
}

/// Format elapsed time as `HH Hours MM Minutes SS Seconds`
///
/// Hours are the total whole hours, so runs longer than a day keep counting.
pub fn format_run_time(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{:02} Hours {:02} Minutes {:02} Seconds",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}
