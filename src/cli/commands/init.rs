//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "tabula.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Tabula configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - Set TABULA_DATABASE_URL");
                println!("     - Set one TABULA_TOKEN_<project id> per exported project");
                println!("  3. Validate configuration: tabula validate-config");
                println!("  4. Configure root-dir and system-enabled in the settings table");
                println!("  5. Schedule: tabula run");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Tabula Configuration File

environment = "development"

[application]
log_level = "info"

[postgresql]
connection_string = "${TABULA_DATABASE_URL}"

[provider]
base_url = "https://redcap.example.org/api/"

[provider.tokens]
# "12" = "${TABULA_TOKEN_12}"

[logging]
local_enabled = true
local_path = "/var/log/tabula"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Tabula Configuration File
#
# Values of the form ${VAR} are replaced with environment variables (a .env
# file in the working directory is loaded first). Any key can also be
# overridden with TABULA_<SECTION>_<KEY>, e.g. TABULA_APPLICATION_DRY_RUN=true.
#
# Job switches (system-enabled, root-dir, include-phi, log-export, ...) are
# not set here. They live in the settings table and are read on every run.

# development, staging or production. Production refuses tls_verify = false.
environment = "production"

[application]
# trace, debug, info, warn, error
log_level = "info"

# Plan and fetch, but write no files and leave settings untouched
dry_run = false

# Echoed in the completion message
job_description = "Export Data Files"

[postgresql]
# Platform database holding the project registry
connection_string = "${TABULA_DATABASE_URL}"
max_connections = 4
connection_timeout_seconds = 30
statement_timeout_seconds = 60

# disable, allow, prefer, require, verify-ca, verify-full
ssl_mode = "prefer"

# Registry table read for eligible projects
projects_table = "redcap_projects"

# Tables owned by the export job, created on first run
settings_table = "tabula_settings"
activity_table = "tabula_activity_log"

# Projects whose name matches this LIKE pattern are never exported
demo_project_pattern = "%redcap_demo_%"

[provider]
# Data export API endpoint
base_url = "https://redcap.example.org/api/"
timeout_seconds = 300
tls_verify = true

# One API token per exported project, keyed by project id
[provider.tokens]
"12" = "${TABULA_TOKEN_12}"
"15" = "${TABULA_TOKEN_15}"

[logging]
# JSON log files next to the console output
local_enabled = true
local_path = "/var/log/tabula"

# daily, hourly or never
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TabulaConfig;
    use tempfile::TempDir;

    #[test]
    fn test_generated_configs_parse() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config: TabulaConfig = toml::from_str(&content).unwrap();
            assert_eq!(config.provider.base_url, "https://redcap.example.org/api/");
        }
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("tabula.toml");
        fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "existing");
    }

    #[tokio::test]
    async fn test_init_writes_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("tabula.toml");

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            with_examples: true,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&output)
            .unwrap()
            .contains("[provider.tokens]"));
    }
}
