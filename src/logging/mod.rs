//! Logging and observability
//!
//! Two separate streams:
//! - diagnostic logging through `tracing` ([`structured`]): console plus an
//!   optional rolling JSON file
//! - the operator-facing run log in the output root ([`run_log`])
//!
//! # Example
//!
//! ```no_run
//! use tabula::logging::init_logging;
//! use tabula::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(project_id = "12", "Exporting project");
//! ```

pub mod run_log;
pub mod structured;

pub use run_log::{run_log_file_name, RunLog, RUN_LOG_EXTENSION, RUN_LOG_STEM};
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a project export
///
/// # Example
///
/// ```no_run
/// use tabula::log_project_start;
/// use tabula::domain::ids::ProjectId;
///
/// let project_id = ProjectId::new("12").unwrap();
/// log_project_start!(&project_id, "Cardiac Registry");
/// ```
#[macro_export]
macro_rules! log_project_start {
    ($project_id:expr, $title:expr) => {
        tracing::info!(
            project_id = %$project_id,
            title = %$title,
            "Exporting project"
        );
    };
}

/// Log the completion of a run
///
/// # Example
///
/// ```no_run
/// use tabula::log_run_complete;
/// use std::time::Duration;
///
/// log_run_complete!(3, 17, Duration::from_secs(42));
/// ```
#[macro_export]
macro_rules! log_run_complete {
    ($projects:expr, $files:expr, $duration:expr) => {
        tracing::info!(
            projects_exported = $projects,
            files_written = $files,
            duration_ms = $duration.as_millis() as u64,
            "Export run completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use tabula::log_error_with_context;
/// use tabula::domain::TabulaError;
///
/// let error = TabulaError::Registry("connection refused".to_string());
/// log_error_with_context!(&error, "Failed to list projects");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
