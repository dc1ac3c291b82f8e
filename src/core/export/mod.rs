//! Export orchestration
//!
//! - [`coordinator`]: the run flow over all projects
//! - [`sink`]: project folders and files on disk
//! - [`outcome`]: run inputs, result messages and elapsed-time formatting
//! - [`summary`]: counters and per-project reports

pub mod coordinator;
pub mod outcome;
pub mod sink;
pub mod summary;

pub use coordinator::ExportCoordinator;
pub use outcome::{format_run_time, JobContext, RunOutcome, RunReport};
pub use sink::{
    dictionary_csv, project_folder_name, sanitize_folder_name, FilesystemSink, WrittenFile,
    ALL_DATA_FILE, DICTIONARY_FILE,
};
pub use summary::{ExportError, ExportErrorType, ExportSummary, ProjectReport};
