//! Run command implementation
//!
//! This module implements the `run` command, one export pass over every
//! eligible project. Schedulers (cron, systemd timers) invoke it directly.

use super::connect_database;
use crate::adapters::api::ApiExportProvider;
use crate::config::load_config;
use crate::core::export::{ExportCoordinator, JobContext, RunReport};
use clap::Args;
use std::sync::Arc;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Job description echoed in the completion message
    #[arg(long)]
    pub description: Option<String>,

    /// Dry run mode - plan and fetch, but write no files
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let description = self
            .description
            .clone()
            .unwrap_or_else(|| config.application.job_description.clone());
        let dry_run = self.dry_run || config.application.dry_run;

        if dry_run {
            tracing::info!("Dry run mode enabled - no files will be written");
            println!("🔍 DRY RUN MODE - No files will be written");
            println!();
        }

        let provider = match ApiExportProvider::new(&config.provider) {
            Ok(p) => Arc::new(p),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create export API client");
                eprintln!("Failed to initialize export API client: {e}");
                return Ok(2);
            }
        };

        let database = match connect_database(&config).await {
            Ok(db) => db,
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to platform database");
                eprintln!("Failed to connect to platform database: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let coordinator =
            ExportCoordinator::new(database.clone(), provider, database.clone(), database);
        let ctx = JobContext::new(description).with_dry_run(dry_run);

        let report = match coordinator.execute(&ctx).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, run_id = %ctx.run_id, "Export run failed");
                eprintln!("Export run failed: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }

        Ok(0)
    }
}

fn print_report(report: &RunReport) {
    let summary = &report.summary;

    println!("{}", report.outcome);
    if !report.outcome.is_completed() {
        return;
    }

    println!();
    println!("📊 Export Summary:");
    println!("  Projects: {}", summary.projects_total);
    println!("  Exported: {}", summary.projects_exported);
    println!("  Disabled: {}", summary.projects_disabled);
    println!("  Files Written: {}", summary.files_written);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    for project in &summary.projects {
        println!(
            "  {} ({}) -> {}: {} file(s){}",
            project.project_id,
            project.title,
            project.folder,
            project.files.len(),
            if project.phi_included { ", PHI included" } else { "" }
        );
        if !project.forms_without_events.is_empty() {
            println!(
                "    Skipped forms without events: {}",
                project.forms_without_events.join(", ")
            );
        }
    }

    if !summary.errors.is_empty() {
        println!();
        println!("⚠️  Errors encountered:");
        for error in &summary.errors {
            println!("  - {:?}: {}", error.error_type, error.message);
            if let Some(context) = &error.context {
                println!("    Context: {context}");
            }
        }
    }
    println!();
}
