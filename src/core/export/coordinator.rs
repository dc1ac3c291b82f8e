//! Export coordinator - main orchestrator for a run
//!
//! One run is a single sequential pass:
//!
//! 1. Check the output root and the system switch
//! 2. Open the run log, record the start
//! 3. List eligible projects from the registry
//! 4. For each enabled project: plan columns, resolve events, fetch CSV data
//!    from the provider, write the files
//! 5. Post-run housekeeping: sample the run log into the settings store and
//!    prune old timestamped logs

use crate::adapters::platform::{
    ActivityLogger, DataExportProvider, ExportRequest, ProjectRegistry, SettingsStore,
};
use crate::config::{keys, AllDataColumns, JobSettings, ProjectSettings};
use crate::core::context::CurrentProject;
use crate::core::export::outcome::{format_run_time, JobContext, RunOutcome, RunReport};
use crate::core::export::sink::{
    form_file_name, project_folder_name, FilesystemSink, ReadmeInfo, ALL_DATA_FILE,
};
use crate::core::export::summary::{ExportError, ExportErrorType, ExportSummary, ProjectReport};
use crate::core::plan::{resolve_form_events, FieldPartitionPlanner, PhiPolicy};
use crate::core::retention::prune_all_but_newest;
use crate::domain::ids::ProjectId;
use crate::domain::{Project, Result};
use crate::logging::{run_log_file_name, RunLog, RUN_LOG_EXTENSION};
use crate::{log_error_with_context, log_project_start, log_run_complete};
use chrono::{DateTime, Local};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Activity log entry when the output root is unusable
pub const DIRECTORY_UNAVAILABLE_EVENT: &str =
    "Export Data Files could not access the output directory.";

/// Activity log entry at the start of a run
pub const RUN_STARTED_EVENT: &str = "Export of CSV data files started.";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Export coordinator
pub struct ExportCoordinator {
    registry: Arc<dyn ProjectRegistry>,
    provider: Arc<dyn DataExportProvider>,
    settings: Arc<dyn SettingsStore>,
    activity: Arc<dyn ActivityLogger>,
    current_project: CurrentProject,
}

/// State shared by every project of one run
struct RunState<'a> {
    ctx: &'a JobContext,
    settings: &'a JobSettings,
    sink: FilesystemSink,
    log: RunLog,
    started_at: DateTime<Local>,
}

impl ExportCoordinator {
    /// Create a coordinator over the four platform collaborators
    pub fn new(
        registry: Arc<dyn ProjectRegistry>,
        provider: Arc<dyn DataExportProvider>,
        settings: Arc<dyn SettingsStore>,
        activity: Arc<dyn ActivityLogger>,
    ) -> Self {
        Self {
            registry,
            provider,
            settings,
            activity,
            current_project: CurrentProject::new(),
        }
    }

    /// Create a coordinator over a single object implementing every collaborator
    pub fn from_platform<P>(platform: Arc<P>) -> Self
    where
        P: ProjectRegistry + DataExportProvider + SettingsStore + ActivityLogger + 'static,
    {
        Self::new(
            platform.clone(),
            platform.clone(),
            platform.clone(),
            platform,
        )
    }

    /// Share the host's current-project handle
    pub fn with_current_project(mut self, current_project: CurrentProject) -> Self {
        self.current_project = current_project;
        self
    }

    /// Current-project handle updated while projects are exported
    pub fn current_project(&self) -> &CurrentProject {
        &self.current_project
    }

    /// Run one export pass and return the result message
    ///
    /// # Errors
    ///
    /// Expected conditions are reported through [`RunOutcome`]. Provider,
    /// settings store, metadata and file write failures propagate.
    pub async fn run(&self, ctx: &JobContext) -> Result<RunOutcome> {
        Ok(self.execute(ctx).await?.outcome)
    }

    /// Run one export pass and return the result message with counters
    ///
    /// # Errors
    ///
    /// Same as [`ExportCoordinator::run`].
    pub async fn execute(&self, ctx: &JobContext) -> Result<RunReport> {
        // Whatever happens below, the host's selection is put back on return.
        let _outer_scope = self.current_project.scope();

        let started_at = Local::now();
        let clock = Instant::now();
        let mut summary = ExportSummary::new();

        let settings = JobSettings::load(self.settings.as_ref()).await?;

        let root = match settings.output_dir() {
            Some(dir) if is_directory(dir).await => dir.to_path_buf(),
            _ => {
                tracing::warn!(root_dir = ?settings.root_dir, "Output directory is not available");
                self.activity
                    .log_event(DIRECTORY_UNAVAILABLE_EVENT, None)
                    .await;
                return Ok(finish_report(RunOutcome::DirectoryUnavailable, summary, clock));
            }
        };

        if !settings.system_enabled {
            tracing::info!("Export job is disabled");
            return Ok(finish_report(RunOutcome::Disabled, summary, clock));
        }

        let log = RunLog::new(
            root.join(run_log_file_name(settings.timestamped_log, started_at)),
            settings.log_export,
        );
        if settings.log_overwrite {
            log.overwrite(started_at);
        }

        let started = started_at.format(TIMESTAMP_FORMAT).to_string();
        if !ctx.dry_run {
            self.settings
                .set_system_setting(keys::SYSTEM_LAST_RUN, &started)
                .await?;
        }

        log.log(format!("Export Data Cron started {started}"));
        self.activity.log_event(RUN_STARTED_EVENT, None).await;
        log.log("Logged start time in the activity log.");
        log.log(format!("Base Directory: {}", root.display()));
        log.log(format!("Documentation File: {}", log.path().display()));
        log.log(format!(
            "Include PHI: {}",
            if settings.include_phi { "Yes" } else { "No" }
        ));
        if ctx.dry_run {
            log.log("Dry run: no files will be written.");
        }

        let state = RunState {
            ctx,
            settings: &settings,
            sink: FilesystemSink::new(&root).with_dry_run(ctx.dry_run),
            log,
            started_at,
        };

        let outcome = match self.registry.list_active_project_ids().await {
            Err(e) => {
                log_error_with_context!(&e, "Failed to list active projects");
                state.log.log("Project IDs could not be generated.");
                summary.add_error(ExportError::new(ExportErrorType::Registry, e.to_string()));
                RunOutcome::NoProjectIds
            }
            Ok(project_ids) => {
                state.log.log("Project IDs generated.");
                if project_ids.is_empty() {
                    state.log.log("There are no production projects to export.");
                }
                summary.projects_total = project_ids.len();

                for project_id in &project_ids {
                    let project_settings =
                        ProjectSettings::load(self.settings.as_ref(), project_id).await?;
                    if !project_settings.enabled {
                        state.log.log(format!(
                            "PID {project_id} export is not enabled in project settings"
                        ));
                        summary.projects_disabled += 1;
                        continue;
                    }
                    self.export_project(&state, project_id, project_settings, &mut summary)
                        .await?;
                }

                state
                    .log
                    .log(format!("Completed in {}", format_run_time(clock.elapsed())));
                log_run_complete!(summary.projects_exported, summary.files_written, clock.elapsed());

                RunOutcome::Completed {
                    description: ctx.description.clone(),
                }
            }
        };

        if !ctx.dry_run {
            self.sample_run_log(&settings, &state.log).await?;
            if settings.timestamped_log {
                prune_all_but_newest(&root, RUN_LOG_EXTENSION).await?;
            }
        }

        let report = finish_report(outcome, summary, clock);
        report.summary.log_summary();
        Ok(report)
    }

    /// Copy the first lines of the run log into the `cron-log-sample` setting
    ///
    /// Samples `min(max-log-lines, 1000)` lines; does nothing when the run
    /// log is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read or the setting written.
    pub async fn sample_run_log(&self, settings: &JobSettings, log: &RunLog) -> Result<()> {
        if !log.is_enabled() {
            return Ok(());
        }
        let sample = log.head(settings.max_log_lines)?.join("\n");
        self.settings
            .set_system_setting(keys::CRON_LOG_SAMPLE, &sample)
            .await
    }

    async fn export_project(
        &self,
        state: &RunState<'_>,
        project_id: &ProjectId,
        project_settings: ProjectSettings,
        summary: &mut ExportSummary,
    ) -> Result<()> {
        let _scope = self.current_project.enter(project_id.clone());

        self.activity
            .log_event(
                &format!("Exported data for project ID {project_id}."),
                Some(project_id),
            )
            .await;

        let info = self.provider.project_info(project_id).await?;
        let project = Project::new(project_id.clone(), info)
            .with_include_phi(project_settings.include_phi)
            .with_enabled(project_settings.enabled);

        log_project_start!(project_id, project.title);
        state.log.log(format!("{}: {} started.", project_id, project.title));

        let folder = project_folder_name(state.settings.folder_naming, &project);
        if let Some(owner) = summary.folder_owner(&folder) {
            tracing::warn!(
                project_id = %project_id,
                folder = %folder,
                previous_project_id = %owner,
                "Project folder already used in this run, files will be overwritten"
            );
            state.log.log(format!(
                "Folder {folder} was already written for PID {owner} in this run; its files will be overwritten."
            ));
        }
        let Some(dir) = state.sink.ensure_project_dir(&folder, &state.log).await else {
            summary.add_error(
                ExportError::new(
                    ExportErrorType::Directory,
                    format!("Project folder {folder} is not available"),
                )
                .with_context(format!("project_id={project_id}")),
            );
            return Ok(());
        };

        let policy = PhiPolicy::new(state.settings.include_phi, project.include_phi);
        let dictionary = self.provider.data_dictionary(project_id).await?;
        let plan = FieldPartitionPlanner::new(policy).plan(&dictionary, project.longitudinal)?;
        let events = resolve_form_events(&self.provider.event_form_map(project_id).await?);

        let mut files = Vec::with_capacity(plan.len() + 3);

        let all_request = match state.settings.all_data_columns {
            AllDataColumns::Planned => ExportRequest::csv().with_columns(plan.all_columns()),
            AllDataColumns::Unfiltered => ExportRequest::csv(),
        };
        let data = self.provider.export_records(project_id, &all_request).await?;
        files.push(
            state
                .sink
                .write_file(&dir, ALL_DATA_FILE, data.as_bytes())
                .await?,
        );
        state.log.log("    Exported all file.");

        let mut forms_without_events = Vec::new();
        for form in plan.forms() {
            let form_events = events.events_for(&form.form_name);
            if form_events.is_empty() {
                tracing::debug!(
                    project_id = %project_id,
                    form = %form.form_name,
                    "Skipping form with no events"
                );
                forms_without_events.push(form.form_name.clone());
                continue;
            }

            let request = ExportRequest::csv()
                .with_columns(form.columns.clone())
                .with_events(form_events.to_vec());
            let data = self.provider.export_records(project_id, &request).await?;
            files.push(
                state
                    .sink
                    .write_file(&dir, &form_file_name(&form.form_name), data.as_bytes())
                    .await?,
            );
        }
        state.log.log("    Exported instrument CSV files.");

        files.push(state.sink.write_dictionary(&dir, &dictionary).await?);

        let readme = state
            .sink
            .write_readme(
                &dir,
                &ReadmeInfo {
                    project: &project,
                    run_id: state.ctx.run_id,
                    started_at: state.started_at,
                    finished_at: Local::now(),
                    phi_included: policy.includes_phi(),
                    files: &files,
                },
            )
            .await?;
        files.push(readme);

        summary.add_project(ProjectReport {
            project_id: project_id.clone(),
            title: project.title,
            folder,
            phi_included: policy.includes_phi(),
            files,
            forms_without_events,
        });

        Ok(())
    }
}

async fn is_directory(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

fn finish_report(outcome: RunOutcome, summary: ExportSummary, clock: Instant) -> RunReport {
    RunReport {
        outcome,
        summary: summary.with_duration(clock.elapsed()),
    }
}
