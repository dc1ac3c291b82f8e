//! Operator settings read from the platform settings store
//!
//! The store holds string values keyed by name at system level and per
//! project. They are parsed once per run into [`JobSettings`] and
//! [`ProjectSettings`]; loading has no side effects.

use crate::adapters::platform::SettingsStore;
use crate::domain::ids::ProjectId;
use crate::domain::Result;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Setting keys
pub mod keys {
    /// System: master switch for the job
    pub const SYSTEM_ENABLED: &str = "system-enabled";
    /// System: output root directory
    pub const ROOT_DIR: &str = "root-dir";
    /// System: write the run log
    pub const LOG_EXPORT: &str = "log-export";
    /// System: truncate the run log at the start of each run
    pub const LOG_OVERWRITE: &str = "log-overwrite";
    /// System and project: PHI opt-in
    pub const INCLUDE_PHI: &str = "include-phi";
    /// System: number of run log lines sampled into [`CRON_LOG_SAMPLE`]
    pub const MAX_LOG_LINES: &str = "max-log-lines";
    /// System: project folder naming (`title` or `project_id`)
    pub const FOLDER_NAMING: &str = "folder-naming";
    /// System: column selection of `all.csv` (`planned` or `unfiltered`)
    pub const ALL_DATA_COLUMNS: &str = "all-data-columns";
    /// System: one timestamped run log per run, older ones pruned
    pub const TIMESTAMPED_LOG: &str = "timestamped-log";
    /// Project: per-project switch
    pub const PROJECT_ENABLED: &str = "project-enabled";
    /// System, written: start time of the last run
    pub const SYSTEM_LAST_RUN: &str = "system-last-run";
    /// System, written: first lines of the run log
    pub const CRON_LOG_SAMPLE: &str = "cron-log-sample";
}

/// Upper bound on sampled run log lines
pub const LOG_SAMPLE_LIMIT: usize = 1000;

/// Interpret a stored flag value
///
/// `1`, `true`, `yes`, `on` and `y` (any case) are true; anything else,
/// including an unset key, is false.
pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on" | "y")
    )
}

/// How project folders are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderNaming {
    /// Sanitized project title
    #[default]
    Title,
    /// Project id
    ProjectId,
}

impl FromStr for FolderNaming {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(FolderNaming::Title),
            "project_id" | "project-id" | "pid" => Ok(FolderNaming::ProjectId),
            other => Err(format!(
                "Invalid folder naming '{other}'. Must be one of: title, project_id"
            )),
        }
    }
}

impl fmt::Display for FolderNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderNaming::Title => write!(f, "title"),
            FolderNaming::ProjectId => write!(f, "project_id"),
        }
    }
}

/// Column selection of the consolidated `all.csv` export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllDataColumns {
    /// Union of the per-form plan columns, so excluded PHI stays out
    #[default]
    Planned,
    /// Every column the provider returns
    Unfiltered,
}

impl FromStr for AllDataColumns {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planned" => Ok(AllDataColumns::Planned),
            "unfiltered" => Ok(AllDataColumns::Unfiltered),
            other => Err(format!(
                "Invalid all-data column mode '{other}'. Must be one of: planned, unfiltered"
            )),
        }
    }
}

impl fmt::Display for AllDataColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllDataColumns::Planned => write!(f, "planned"),
            AllDataColumns::Unfiltered => write!(f, "unfiltered"),
        }
    }
}

/// System-level job settings for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSettings {
    /// Master switch
    pub system_enabled: bool,

    /// Output root; `None` when unset or blank
    pub root_dir: Option<PathBuf>,

    /// Write the run log
    pub log_export: bool,

    /// Truncate the run log at start
    pub log_overwrite: bool,

    /// System-wide PHI opt-in
    pub include_phi: bool,

    /// Run log lines to sample after the run, at most [`LOG_SAMPLE_LIMIT`]
    pub max_log_lines: usize,

    /// Project folder naming
    pub folder_naming: FolderNaming,

    /// Column selection of `all.csv`
    pub all_data_columns: AllDataColumns,

    /// Timestamped run log with retention pruning
    pub timestamped_log: bool,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            system_enabled: false,
            root_dir: None,
            log_export: false,
            log_overwrite: false,
            include_phi: false,
            max_log_lines: LOG_SAMPLE_LIMIT,
            folder_naming: FolderNaming::default(),
            all_data_columns: AllDataColumns::default(),
            timestamped_log: false,
        }
    }
}

impl JobSettings {
    /// Read and parse the system-level settings
    ///
    /// Unparseable enum or numeric values fall back to their defaults with a
    /// warning rather than failing the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings store cannot be read.
    pub async fn load(store: &dyn SettingsStore) -> Result<Self> {
        let flag = |value: Option<String>| parse_flag(value.as_deref());

        let root_dir = store
            .system_setting(keys::ROOT_DIR)
            .await?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let max_log_lines = match store.system_setting(keys::MAX_LOG_LINES).await? {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) => n.min(LOG_SAMPLE_LIMIT),
                Err(_) => {
                    tracing::warn!(value = %raw, "Ignoring invalid max-log-lines setting");
                    LOG_SAMPLE_LIMIT
                }
            },
            None => LOG_SAMPLE_LIMIT,
        };

        Ok(Self {
            system_enabled: flag(store.system_setting(keys::SYSTEM_ENABLED).await?),
            root_dir,
            log_export: flag(store.system_setting(keys::LOG_EXPORT).await?),
            log_overwrite: flag(store.system_setting(keys::LOG_OVERWRITE).await?),
            include_phi: flag(store.system_setting(keys::INCLUDE_PHI).await?),
            max_log_lines,
            folder_naming: parse_or_default(
                keys::FOLDER_NAMING,
                store.system_setting(keys::FOLDER_NAMING).await?,
            ),
            all_data_columns: parse_or_default(
                keys::ALL_DATA_COLUMNS,
                store.system_setting(keys::ALL_DATA_COLUMNS).await?,
            ),
            timestamped_log: flag(store.system_setting(keys::TIMESTAMPED_LOG).await?),
        })
    }

    /// Output root, if configured
    pub fn output_dir(&self) -> Option<&Path> {
        self.root_dir.as_deref()
    }
}

fn parse_or_default<T>(key: &str, value: Option<String>) -> T
where
    T: FromStr<Err = String> + Default,
{
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse().unwrap_or_else(|e: String| {
            tracing::warn!(setting = key, error = %e, "Using default for invalid setting");
            T::default()
        }),
        None => T::default(),
    }
}

/// Project-level settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProjectSettings {
    /// Per-project switch
    pub enabled: bool,

    /// Project PHI opt-in
    pub include_phi: bool,
}

impl ProjectSettings {
    /// Read the settings of one project
    ///
    /// # Errors
    ///
    /// Returns an error if the settings store cannot be read.
    pub async fn load(store: &dyn SettingsStore, project_id: &ProjectId) -> Result<Self> {
        Ok(Self {
            enabled: parse_flag(
                store
                    .project_setting(project_id, keys::PROJECT_ENABLED)
                    .await?
                    .as_deref(),
            ),
            include_phi: parse_flag(
                store
                    .project_setting(project_id, keys::INCLUDE_PHI)
                    .await?
                    .as_deref(),
            ),
        })
    }
}
