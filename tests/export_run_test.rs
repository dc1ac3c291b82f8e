//! Integration tests for a full export run against the in-memory platform

use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tabula::adapters::memory::{InMemoryPlatform, ProjectFixture, RecordTable};
use tabula::config::keys;
use tabula::core::context::CurrentProject;
use tabula::core::export::coordinator::{DIRECTORY_UNAVAILABLE_EVENT, RUN_STARTED_EVENT};
use tabula::core::export::{ExportCoordinator, ExportErrorType, JobContext, RunOutcome};
use tabula::core::plan::EventFormMap;
use tabula::domain::ids::{EventId, ProjectId};
use tabula::domain::{DataDictionary, FieldDescriptor, ProjectInfo, TabulaError};
use tempfile::TempDir;

const DESCRIPTION: &str = "Export Data Files";

fn pid(id: &str) -> ProjectId {
    ProjectId::new(id).unwrap()
}

fn event(name: &str) -> EventId {
    EventId::new(name).unwrap()
}

/// demographics: id, age; vitals: bp (identifier); both collected at event1
fn study_fixture() -> ProjectFixture {
    ProjectFixture {
        info: ProjectInfo::new("Heart Study", false),
        dictionary: DataDictionary::new(vec![
            FieldDescriptor::new("id", "demographics"),
            FieldDescriptor::new("age", "demographics"),
            FieldDescriptor::new("bp", "vitals").identifier(),
        ]),
        event_forms: EventFormMap::new().with_event(event("event1"), ["demographics", "vitals"]),
        records: RecordTable::new([
            "id",
            "redcap_event_name",
            "redcap_repeat_instance",
            "redcap_repeat_instrument",
            "age",
            "bp",
            "demographics_completed",
            "vitals_completed",
        ])
        .with_row(["1", "event1", "", "", "54", "120/80", "2", "2"])
        .with_row(["2", "event1", "", "", "61", "135/90", "2", "0"]),
    }
}

struct Harness {
    root: TempDir,
    platform: Arc<InMemoryPlatform>,
    project_id: ProjectId,
}

impl Harness {
    /// Enabled system, enabled project 12, output root in a temp dir
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let platform = Arc::new(InMemoryPlatform::new());
        let project_id = pid("12");

        platform.add_project(project_id.clone(), study_fixture());
        platform.set_system(keys::ROOT_DIR, &root.path().display().to_string());
        platform.set_system(keys::SYSTEM_ENABLED, "1");
        platform.set_project(&project_id, keys::PROJECT_ENABLED, "1");

        Self {
            root,
            platform,
            project_id,
        }
    }

    fn coordinator(&self) -> ExportCoordinator {
        ExportCoordinator::from_platform(self.platform.clone())
    }

    fn project_dir(&self) -> std::path::PathBuf {
        self.root.path().join("Heart Study")
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.project_dir().join(name)).unwrap()
    }

    fn run_log(&self) -> String {
        fs::read_to_string(self.root.path().join("Cron documentation.log")).unwrap_or_default()
    }
}

fn header(csv: &str) -> Vec<&str> {
    csv.lines().next().unwrap_or_default().split(',').collect()
}

fn log_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".log"))
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_forms_are_exported_with_planned_columns() {
    let harness = Harness::new();

    let report = harness
        .coordinator()
        .execute(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    assert_eq!(
        report.outcome.to_string(),
        "The \"Export Data Files\" cron job completed successfully."
    );
    assert_eq!(report.summary.projects_exported, 1);

    assert_eq!(
        header(&harness.read("demographics.csv")),
        vec![
            "id",
            "redcap_repeat_instance",
            "redcap_repeat_instrument",
            "age",
            "demographics_completed"
        ]
    );
    assert_eq!(
        header(&harness.read("vitals.csv")),
        vec![
            "id",
            "redcap_repeat_instance",
            "redcap_repeat_instrument",
            "vitals_completed"
        ]
    );

    let requests = harness.platform.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].1.events, Some(vec![event("event1")]));
}

#[tokio::test]
async fn test_project_folder_contents() {
    let harness = Harness::new();

    harness
        .coordinator()
        .run(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    let dictionary = harness.read("dictionary.csv");
    assert!(dictionary.starts_with("field_name,form_name,field_type,field_label,identifier"));
    assert!(dictionary.contains("bp,vitals,text,,y"));

    let readme = harness.read("_readme_Heart Study.txt");
    assert!(readme.contains("Project ID: 12"));
    assert!(readme.contains("PHI included: No"));
    assert!(readme.contains("all.csv"));
    assert!(readme.contains("dictionary.csv"));

    assert!(harness
        .platform
        .activity()
        .contains(&("Exported data for project ID 12.".to_string(), Some(pid("12")))));
    assert!(harness
        .platform
        .activity()
        .contains(&(RUN_STARTED_EVENT.to_string(), None)));
}

#[tokio::test]
async fn test_disabled_system_writes_nothing() {
    let harness = Harness::new();
    harness.platform.set_system(keys::SYSTEM_ENABLED, "0");
    harness.platform.set_system(keys::LOG_EXPORT, "1");

    let outcome = harness
        .coordinator()
        .run(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Disabled);
    assert_eq!(outcome.to_string(), "Disabled.");
    assert_eq!(fs::read_dir(harness.root.path()).unwrap().count(), 0);
    assert!(harness.platform.requests().is_empty());
    assert!(harness.platform.system_value(keys::SYSTEM_LAST_RUN).is_none());
}

#[tokio::test]
async fn test_missing_directory_is_reported() {
    let harness = Harness::new();
    let missing = harness.root.path().join("does-not-exist");
    harness
        .platform
        .set_system(keys::ROOT_DIR, &missing.display().to_string());

    let outcome = harness
        .coordinator()
        .run(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    assert_eq!(outcome.to_string(), "The export directory is not available.");
    assert_eq!(
        harness.platform.activity(),
        vec![(DIRECTORY_UNAVAILABLE_EVENT.to_string(), None)]
    );
    assert!(!missing.exists());
}

#[tokio::test]
async fn test_unset_root_dir_is_reported() {
    let platform = Arc::new(InMemoryPlatform::new());
    platform.set_system(keys::SYSTEM_ENABLED, "1");

    let outcome = ExportCoordinator::from_platform(platform)
        .run(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::DirectoryUnavailable);
}

#[tokio::test]
async fn test_registry_failure_yields_no_project_ids() {
    let harness = Harness::new();
    harness.platform.set_system(keys::LOG_EXPORT, "1");
    harness.platform.fail_registry("connection refused");

    let report = harness
        .coordinator()
        .execute(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    assert_eq!(report.outcome.to_string(), "No project IDs.");
    assert_eq!(report.summary.errors.len(), 1);
    assert_eq!(report.summary.errors[0].error_type, ExportErrorType::Registry);
    assert!(harness.run_log().contains("Project IDs could not be generated."));
    assert!(!harness.project_dir().exists());
}

#[tokio::test]
async fn test_empty_registry_completes() {
    let platform = Arc::new(InMemoryPlatform::new());
    let root = TempDir::new().unwrap();
    platform.set_system(keys::ROOT_DIR, &root.path().display().to_string());
    platform.set_system(keys::SYSTEM_ENABLED, "yes");
    platform.set_system(keys::LOG_EXPORT, "yes");

    let report = ExportCoordinator::from_platform(platform)
        .execute(&JobContext::new("Nightly"))
        .await
        .unwrap();

    assert!(report.outcome.is_completed());
    assert_eq!(report.summary.projects_total, 0);
    let log = fs::read_to_string(root.path().join("Cron documentation.log")).unwrap();
    assert!(log.contains("There are no production projects to export."));
    assert!(log.contains("Completed in 00 Hours 00 Minutes"));
}

#[tokio::test]
async fn test_disabled_project_is_skipped() {
    let harness = Harness::new();
    harness.platform.set_system(keys::LOG_EXPORT, "1");
    harness
        .platform
        .set_project(&harness.project_id, keys::PROJECT_ENABLED, "0");

    let report = harness
        .coordinator()
        .execute(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    assert!(report.outcome.is_completed());
    assert_eq!(report.summary.projects_disabled, 1);
    assert_eq!(report.summary.projects_exported, 0);
    assert!(!harness.project_dir().exists());
    assert!(harness
        .run_log()
        .contains("PID 12 export is not enabled in project settings"));
}

#[tokio::test]
async fn test_form_without_events_produces_no_file() {
    let harness = Harness::new();
    let mut fixture = study_fixture();
    fixture.dictionary = DataDictionary::new(vec![
        FieldDescriptor::new("id", "demographics"),
        FieldDescriptor::new("age", "demographics"),
        FieldDescriptor::new("a1c", "labs"),
    ]);
    harness.platform.add_project(harness.project_id.clone(), fixture);

    let report = harness
        .coordinator()
        .execute(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    assert!(harness.project_dir().join("demographics.csv").is_file());
    assert!(!harness.project_dir().join("labs.csv").exists());
    assert_eq!(report.summary.projects[0].forms_without_events, vec!["labs"]);
}

#[tokio::test]
async fn test_phi_excluded_from_all_data_file() {
    let harness = Harness::new();

    harness
        .coordinator()
        .run(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    let all = harness.read("all.csv");
    let columns = header(&all);
    assert!(columns.contains(&"age"));
    assert!(!columns.contains(&"bp"));
}

#[tokio::test]
async fn test_phi_included_when_both_levels_opt_in() {
    let harness = Harness::new();
    harness.platform.set_system(keys::INCLUDE_PHI, "1");
    harness
        .platform
        .set_project(&harness.project_id, keys::INCLUDE_PHI, "1");

    let report = harness
        .coordinator()
        .execute(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    assert!(header(&harness.read("all.csv")).contains(&"bp"));
    assert!(header(&harness.read("vitals.csv")).contains(&"bp"));
    assert!(report.summary.projects[0].phi_included);
}

#[tokio::test]
async fn test_system_phi_alone_is_not_enough() {
    let harness = Harness::new();
    harness.platform.set_system(keys::INCLUDE_PHI, "1");

    harness
        .coordinator()
        .run(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    assert!(!header(&harness.read("vitals.csv")).contains(&"bp"));
}

#[tokio::test]
async fn test_unfiltered_all_data_file() {
    let harness = Harness::new();
    harness
        .platform
        .set_system(keys::ALL_DATA_COLUMNS, "unfiltered");

    harness
        .coordinator()
        .run(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    assert!(header(&harness.read("all.csv")).contains(&"bp"));
    assert_eq!(harness.platform.requests()[0].1.columns, None);
}

#[tokio::test]
async fn test_folder_named_by_project_id() {
    let harness = Harness::new();
    harness.platform.set_system(keys::FOLDER_NAMING, "project_id");

    harness
        .coordinator()
        .run(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    let folder = harness.root.path().join("12");
    assert!(folder.join("all.csv").is_file());
    assert!(folder.join("_readme_Heart Study.txt").is_file());
    assert!(!folder.join("_readme_12.txt").exists());
}

#[tokio::test]
async fn test_directory_failure_skips_only_that_project() {
    let harness = Harness::new();
    let second = pid("13");
    harness.platform.add_project(
        second.clone(),
        ProjectFixture {
            info: ProjectInfo::new("Second Study", false),
            ..study_fixture()
        },
    );
    harness.platform.set_project(&second, keys::PROJECT_ENABLED, "1");
    harness.platform.set_system(keys::LOG_EXPORT, "1");
    fs::write(harness.project_dir(), "not a directory").unwrap();

    let report = harness
        .coordinator()
        .execute(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    assert!(report.outcome.is_completed());
    assert_eq!(report.summary.directory_failures(), 1);
    assert_eq!(report.summary.projects_exported, 1);
    assert_eq!(report.summary.projects[0].project_id, second);
    assert!(harness.root.path().join("Second Study").join("all.csv").is_file());
    assert!(harness.run_log().contains("Skipping project: directory"));
}

#[tokio::test]
async fn test_shared_folder_is_reported() {
    let harness = Harness::new();
    let second = pid("13");
    harness.platform.add_project(
        second.clone(),
        ProjectFixture {
            info: ProjectInfo::new("Heart Study?", false),
            ..study_fixture()
        },
    );
    harness.platform.set_project(&second, keys::PROJECT_ENABLED, "1");
    harness.platform.set_system(keys::LOG_EXPORT, "1");

    let report = harness
        .coordinator()
        .execute(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    assert_eq!(report.summary.projects_exported, 2);
    assert!(harness
        .run_log()
        .contains("Folder Heart Study was already written for PID 12 in this run"));
}

#[tokio::test]
async fn test_current_project_restored_after_run() {
    let harness = Harness::new();
    let current = CurrentProject::with_project(pid("99"));
    let coordinator = harness.coordinator().with_current_project(current.clone());

    coordinator.run(&JobContext::new(DESCRIPTION)).await.unwrap();

    assert_eq!(current.get(), Some(pid("99")));
}

#[tokio::test]
async fn test_current_project_restored_after_provider_error() {
    let harness = Harness::new();
    harness.platform.fail_provider_for(harness.project_id.clone());
    let current = CurrentProject::with_project(pid("99"));
    let coordinator = harness.coordinator().with_current_project(current.clone());

    let err = coordinator
        .run(&JobContext::new(DESCRIPTION))
        .await
        .unwrap_err();

    assert!(matches!(err, TabulaError::Provider(_)));
    assert_eq!(current.get(), Some(pid("99")));
}

#[tokio::test]
async fn test_log_overwrite_and_sample() {
    let harness = Harness::new();
    harness.platform.set_system(keys::LOG_EXPORT, "1");
    harness.platform.set_system(keys::LOG_OVERWRITE, "1");
    harness.platform.set_system(keys::MAX_LOG_LINES, "3");
    let log_path = harness.root.path().join("Cron documentation.log");
    fs::write(&log_path, "stale line from last week\n").unwrap();

    harness
        .coordinator()
        .run(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    let log = harness.run_log();
    assert!(!log.contains("stale line"));
    assert!(log.lines().next().unwrap().ends_with(": Log Overwritten"));
    assert!(log.contains("12: Heart Study started."));
    assert!(log.contains("    Exported all file."));
    assert!(log.contains("    Exported instrument CSV files."));

    let sample = harness
        .platform
        .system_value(keys::CRON_LOG_SAMPLE)
        .unwrap();
    let lines: Vec<&str> = sample.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with(": Log Overwritten"));
    assert!(lines[1].contains("Export Data Cron started"));
}

#[tokio::test]
async fn test_log_appends_without_overwrite() {
    let harness = Harness::new();
    harness.platform.set_system(keys::LOG_EXPORT, "1");
    let log_path = harness.root.path().join("Cron documentation.log");
    fs::write(&log_path, "previous run\n").unwrap();

    harness
        .coordinator()
        .run(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    let log = harness.run_log();
    assert!(log.starts_with("previous run\n"));
    assert!(log.contains("Include PHI: No"));
}

#[tokio::test]
async fn test_timestamped_logs_are_pruned() {
    let harness = Harness::new();
    harness.platform.set_system(keys::LOG_EXPORT, "1");
    harness.platform.set_system(keys::TIMESTAMPED_LOG, "1");

    for (name, secs) in [
        ("Cron documentation 2024-01-01_000000.log", 1_704_067_200),
        ("Cron documentation 2024-01-02_000000.log", 1_704_153_600),
    ] {
        let path = harness.root.path().join(name);
        fs::write(&path, "old\n").unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(secs, 0)).unwrap();
    }

    harness
        .coordinator()
        .run(&JobContext::new(DESCRIPTION))
        .await
        .unwrap();

    let logs = log_files(harness.root.path());
    assert_eq!(logs.len(), 1);
    assert!(logs[0].starts_with("Cron documentation "));
    assert!(!logs[0].starts_with("Cron documentation 2024-01-0"));
    // Project folders are never pruned.
    assert!(harness.project_dir().join("all.csv").is_file());
}

#[tokio::test]
async fn test_dry_run_writes_nothing_but_the_run_log() {
    let harness = Harness::new();
    harness.platform.set_system(keys::LOG_EXPORT, "1");

    let report = harness
        .coordinator()
        .execute(&JobContext::new(DESCRIPTION).with_dry_run(true))
        .await
        .unwrap();

    assert!(report.outcome.is_completed());
    assert!(!harness.project_dir().exists());
    assert!(harness.run_log().contains("Dry run: no files will be written."));
    assert!(harness.platform.system_value(keys::SYSTEM_LAST_RUN).is_none());
    assert!(harness.platform.system_value(keys::CRON_LOG_SAMPLE).is_none());
}
