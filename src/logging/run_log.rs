//! Operator-facing run log
//!
//! A plain text file in the output root that documents what each run did.
//! Every entry is one `HH:MM:SS: <message>` line. Writing is gated by the
//! `log-export` setting and never fails the run: I/O problems are reported
//! through tracing and otherwise ignored. Entries are mirrored to tracing
//! regardless of the gate.

use crate::config::LOG_SAMPLE_LIMIT;
use crate::domain::Result;
use crate::domain::context::ResultExt;
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Base name of the run log
pub const RUN_LOG_STEM: &str = "Cron documentation";

/// Extension of the run log
pub const RUN_LOG_EXTENSION: &str = "log";

/// Run log file name
///
/// With `timestamped` each run gets its own file,
/// `Cron documentation <YYYY-mm-dd_HHMMSS>.log`; otherwise all runs share
/// `Cron documentation.log`.
pub fn run_log_file_name(timestamped: bool, started_at: DateTime<Local>) -> String {
    if timestamped {
        format!(
            "{RUN_LOG_STEM} {}.{RUN_LOG_EXTENSION}",
            started_at.format("%Y-%m-%d_%H%M%S")
        )
    } else {
        format!("{RUN_LOG_STEM}.{RUN_LOG_EXTENSION}")
    }
}

/// Append-only run log
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
    enabled: bool,
}

impl RunLog {
    /// Create a run log writing to `path` when `enabled`
    pub fn new(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            path: path.into(),
            enabled,
        }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether entries are written to the file
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Truncate the log and write the overwrite marker
    ///
    /// Runs even when entry logging is disabled, so an operator who turns on
    /// overwrite always gets a fresh file.
    pub fn overwrite(&self, at: DateTime<Local>) {
        let line = format!("{}: Log Overwritten\n", at.format("%Y-%m-%d %H:%M:%S"));
        if let Err(e) = fs::write(&self.path, line) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to overwrite run log");
        }
    }

    /// Append an entry stamped with the current local time
    pub fn log(&self, message: impl AsRef<str>) {
        self.log_at(Local::now(), message);
    }

    /// Append an entry stamped with `at`
    pub fn log_at(&self, at: DateTime<Local>, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::info!(target: "tabula::run_log", "{}", message);

        if !self.enabled {
            return;
        }

        let line = format!("{}: {}", at.format("%H:%M:%S"), message);
        if let Err(e) = self.append(&line) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write run log");
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }

    /// First `min(n, 1000)` lines of the log
    ///
    /// A missing file yields no lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn head(&self, n: usize) -> Result<Vec<String>> {
        let limit = n.min(LOG_SAMPLE_LIMIT);
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).context(format!("Failed to open run log {}", self.path.display()))
            }
        };

        BufReader::new(file)
            .lines()
            .take(limit)
            .collect::<std::io::Result<Vec<_>>>()
            .context(format!("Failed to read run log {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, h, m, s).unwrap()
    }

    #[test]
    fn test_file_names() {
        assert_eq!(run_log_file_name(false, at(1, 2, 3)), "Cron documentation.log");
        assert_eq!(
            run_log_file_name(true, at(1, 2, 3)),
            "Cron documentation 2024-03-09_010203.log"
        );
    }

    #[test]
    fn test_entries_are_time_prefixed() {
        let dir = TempDir::new().unwrap();
        let log = RunLog::new(dir.path().join("run.log"), true);

        log.log_at(at(7, 5, 9), "Base Directory: /data");
        log.log_at(at(7, 5, 10), "Include PHI: No");

        let contents = fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents, "07:05:09: Base Directory: /data\n07:05:10: Include PHI: No\n");
    }

    #[test]
    fn test_disabled_log_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let log = RunLog::new(dir.path().join("run.log"), false);

        log.log("ignored");

        assert!(!log.path().exists());
        assert!(!log.is_enabled());
    }

    #[test]
    fn test_overwrite_truncates() {
        let dir = TempDir::new().unwrap();
        let log = RunLog::new(dir.path().join("run.log"), true);
        log.log("previous run");

        log.overwrite(at(23, 59, 1));
        log.log_at(at(23, 59, 2), "fresh");

        let contents = fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents, "2024-03-09 23:59:01: Log Overwritten\n23:59:02: fresh\n");
    }

    #[test]
    fn test_overwrite_ignores_entry_gate() {
        let dir = TempDir::new().unwrap();
        let log = RunLog::new(dir.path().join("run.log"), false);

        log.overwrite(at(0, 0, 0));

        assert!(log.path().exists());
    }

    #[test]
    fn test_head_is_capped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.log");
        let lines: String = (0..1200).map(|i| format!("line {i}\n")).collect();
        fs::write(&path, lines).unwrap();
        let log = RunLog::new(&path, true);

        assert_eq!(log.head(3).unwrap(), vec!["line 0", "line 1", "line 2"]);
        assert_eq!(log.head(5000).unwrap().len(), 1000);
        assert!(log.head(0).unwrap().is_empty());
    }

    #[test]
    fn test_head_of_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let log = RunLog::new(dir.path().join("absent.log"), true);

        assert!(log.head(10).unwrap().is_empty());
    }
}
