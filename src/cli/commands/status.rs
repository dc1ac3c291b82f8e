//! Status command implementation
//!
//! This module implements the `status` command: when the job last ran, the
//! run log lines sampled at the end of that run, and the projects that the
//! next run would consider.

use super::connect_database;
use crate::adapters::platform::{ProjectRegistry, SettingsStore};
use crate::config::{keys, load_config};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Skip the sampled run log
    #[arg(long)]
    pub no_log: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking export status");

        println!("📊 Export Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {}", e);
                return Ok(2); // Configuration error exit code
            }
        };

        let database = match connect_database(&config).await {
            Ok(db) => db,
            Err(e) => {
                println!("❌ Failed to connect to database");
                println!("   Error: {}", e);
                return Ok(4); // Connection error exit code
            }
        };

        let (last_run, log_sample) = match (
            database.system_setting(keys::SYSTEM_LAST_RUN).await,
            database.system_setting(keys::CRON_LOG_SAMPLE).await,
        ) {
            (Ok(last_run), Ok(sample)) => (last_run, sample),
            (Err(e), _) | (_, Err(e)) => {
                println!("❌ Failed to read job settings");
                println!("   Error: {}", e);
                return Ok(5); // Fatal error exit code
            }
        };

        match last_run {
            Some(ts) => println!("Last run: {ts}"),
            None => {
                println!("No export history found.");
                println!("Run 'tabula run' to start exporting data.");
            }
        }

        match database.list_active_project_ids().await {
            Ok(ids) if ids.is_empty() => println!("Active projects: none"),
            Ok(ids) => {
                let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
                println!("Active projects ({}): {}", ids.len(), ids.join(", "));
            }
            Err(e) => println!("Active projects: unavailable ({e})"),
        }

        if !self.no_log {
            if let Some(sample) = log_sample.filter(|s| !s.is_empty()) {
                println!();
                println!("Run log sample:");
                println!("{}", "-".repeat(60));
                for line in sample.lines() {
                    println!("{line}");
                }
                println!("{}", "-".repeat(60));
            }
        }

        println!();
        Ok(0)
    }
}
