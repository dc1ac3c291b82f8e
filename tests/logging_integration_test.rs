//! Integration tests for logging functionality

use chrono::{Local, TimeZone};
use std::fs;
use tabula::config::LoggingConfig;
use tabula::logging::{init_logging, run_log_file_name, RunLog};
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(config.local_enabled);
    assert_eq!(config.local_rotation, "daily");
    assert_eq!(config.local_path, "/var/log/tabula");
}

#[test]
fn test_invalid_log_level_is_rejected_before_install() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");
    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "daily".to_string(),
    };

    assert!(init_logging("chatty", &config).is_err());
    assert!(!log_path.exists());
}

#[test]
fn test_run_log_file_names() {
    let started = Local.with_ymd_and_hms(2025, 3, 9, 7, 5, 0).unwrap();

    assert_eq!(run_log_file_name(false, started), "Cron documentation.log");
    assert_eq!(
        run_log_file_name(true, started),
        "Cron documentation 2025-03-09_070500.log"
    );
}

#[test]
fn test_run_log_entries_and_gate() {
    let temp_dir = TempDir::new().unwrap();
    let enabled = RunLog::new(temp_dir.path().join("on.log"), true);
    let disabled = RunLog::new(temp_dir.path().join("off.log"), false);
    let at = Local.with_ymd_and_hms(2025, 3, 9, 23, 59, 58).unwrap();

    enabled.log_at(at, "Project IDs generated.");
    disabled.log_at(at, "Project IDs generated.");

    assert_eq!(
        fs::read_to_string(enabled.path()).unwrap(),
        "23:59:58: Project IDs generated.\n"
    );
    assert!(!disabled.path().exists());
}

#[test]
fn test_overwrite_ignores_gate() {
    let temp_dir = TempDir::new().unwrap();
    let log = RunLog::new(temp_dir.path().join("run.log"), false);
    fs::write(log.path(), "old\nentries\n").unwrap();

    log.overwrite(Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap());

    assert_eq!(
        fs::read_to_string(log.path()).unwrap(),
        "2025-01-02 03:04:05: Log Overwritten\n"
    );
}

#[test]
fn test_head_is_capped() {
    let temp_dir = TempDir::new().unwrap();
    let log = RunLog::new(temp_dir.path().join("run.log"), true);
    let contents: String = (0..1200).map(|i| format!("line {i}\n")).collect();
    fs::write(log.path(), contents).unwrap();

    assert_eq!(log.head(5).unwrap().len(), 5);
    let capped = log.head(5000).unwrap();
    assert_eq!(capped.len(), 1000);
    assert_eq!(capped[999], "line 999");
}

#[test]
fn test_head_of_missing_log_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let log = RunLog::new(temp_dir.path().join("missing.log"), true);
    assert!(log.head(10).unwrap().is_empty());
}
