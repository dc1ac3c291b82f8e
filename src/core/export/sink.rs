//! Filesystem sink for export artifacts
//!
//! Layout under the output root:
//!
//! ```text
//! <root>/<folder>/all.csv
//! <root>/<folder>/<form>.csv
//! <root>/<folder>/dictionary.csv
//! <root>/<folder>/_readme_<title>.txt
//! ```
//!
//! In dry-run mode nothing is created or written; sizes and checksums are
//! still computed so the run can report what it would have produced.

use crate::config::FolderNaming;
use crate::domain::context::ResultExt;
use crate::domain::{DataDictionary, Project, Result};
use crate::logging::RunLog;
use chrono::{DateTime, Local};
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use uuid::Uuid;

/// Consolidated export file name
pub const ALL_DATA_FILE: &str = "all.csv";

/// Data dictionary file name
pub const DICTIONARY_FILE: &str = "dictionary.csv";

/// Directory permissions for created project folders
#[cfg(unix)]
pub const PROJECT_DIR_MODE: u32 = 0o744;

/// Per-form export file name
pub fn form_file_name(form_name: &str) -> String {
    format!("{form_name}.csv")
}

/// Readme file name for a project
///
/// Always named after the sanitized title, whatever the folder naming.
pub fn readme_file_name(project: &Project) -> String {
    format!(
        "_readme_{}.txt",
        project_folder_name(FolderNaming::Title, project)
    )
}

fn unsafe_folder_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[^\w\s\d\-_~,;\[\]\(\).]").expect("folder name pattern is a valid literal")
    })
}

/// Strip every character outside `[\w\s\d\-_~,;\[\]\(\).]` from a title
pub fn sanitize_folder_name(title: &str) -> String {
    unsafe_folder_chars().replace_all(title, "").into_owned()
}

/// Folder name for a project
///
/// Falls back to the project id when the sanitized title is empty or made
/// only of dots and whitespace, so a title can never name the root itself or
/// its parent.
pub fn project_folder_name(naming: FolderNaming, project: &Project) -> String {
    match naming {
        FolderNaming::ProjectId => project.id.to_string(),
        FolderNaming::Title => {
            let sanitized = sanitize_folder_name(&project.title);
            if sanitized
                .trim_matches(|c: char| c == '.' || c.is_whitespace())
                .is_empty()
            {
                project.id.to_string()
            } else {
                sanitized
            }
        }
    }
}

/// A file produced for a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    /// File name within the project folder
    pub name: String,

    /// Size in bytes
    pub bytes: u64,

    /// Lowercase hex SHA-256 of the contents
    pub sha256: String,
}

impl WrittenFile {
    fn describe(name: impl Into<String>, contents: &[u8]) -> Self {
        Self {
            name: name.into(),
            bytes: contents.len() as u64,
            sha256: format!("{:x}", Sha256::digest(contents)),
        }
    }
}

/// Contents of a project readme
#[derive(Debug, Clone)]
pub struct ReadmeInfo<'a> {
    /// Exported project
    pub project: &'a Project,

    /// Identifier of the run
    pub run_id: Uuid,

    /// Run start
    pub started_at: DateTime<Local>,

    /// Project export end
    pub finished_at: DateTime<Local>,

    /// Whether PHI fields were exported
    pub phi_included: bool,

    /// Data files written for the project
    pub files: &'a [WrittenFile],
}

/// Render a project readme
pub fn render_readme(info: &ReadmeInfo<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Project ID: {}", info.project.id);
    let _ = writeln!(out, "Project title: {}", info.project.title);
    let _ = writeln!(out, "Run ID: {}", info.run_id);
    let _ = writeln!(out, "Export started: {}", info.started_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Export finished: {}", info.finished_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "PHI included: {}", if info.phi_included { "Yes" } else { "No" });
    let _ = writeln!(out);
    let _ = writeln!(out, "Files:");
    for file in info.files {
        let _ = writeln!(out, "  {}  {} bytes  sha256:{}", file.name, file.bytes, file.sha256);
    }
    out
}

/// Writes export artifacts below an output root
#[derive(Debug, Clone)]
pub struct FilesystemSink {
    root: PathBuf,
    dry_run: bool,
}

impl FilesystemSink {
    /// Create a sink rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
        }
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Output root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True in dry-run mode
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Create the project folder if needed and confirm it exists
    ///
    /// Creation failures are logged, not raised: `None` means the project
    /// must be skipped.
    pub async fn ensure_project_dir(&self, folder: &str, log: &RunLog) -> Option<PathBuf> {
        let path = self.root.join(folder);

        if self.dry_run {
            return Some(path);
        }

        if tokio::fs::metadata(&path).await.is_err() {
            log.log(format!("Created new directory {}", path.display()));
            if let Err(e) = create_dir(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to create project directory");
                log.log(format!("Unable to make new directory {}", path.display()));
            }
        }

        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_dir() => Some(path),
            _ => {
                log.log(format!(
                    "Skipping project: directory {} is not available",
                    path.display()
                ));
                None
            }
        }
    }

    /// Write a file into a project folder
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub async fn write_file(&self, dir: &Path, name: &str, contents: &[u8]) -> Result<WrittenFile> {
        let written = WrittenFile::describe(name, contents);
        let path = dir.join(name);

        if self.dry_run {
            tracing::info!(path = %path.display(), bytes = written.bytes, "Dry run: skipping write");
            return Ok(written);
        }

        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = written.bytes, "Wrote export file");
        Ok(written)
    }

    /// Write `dictionary.csv`
    ///
    /// # Errors
    ///
    /// Returns an error if the dictionary cannot be serialized or written.
    pub async fn write_dictionary(&self, dir: &Path, dictionary: &DataDictionary) -> Result<WrittenFile> {
        let contents = dictionary_csv(dictionary)?;
        self.write_file(dir, DICTIONARY_FILE, &contents).await
    }

    /// Write the project readme
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub async fn write_readme(&self, dir: &Path, info: &ReadmeInfo<'_>) -> Result<WrittenFile> {
        let contents = render_readme(info);
        self.write_file(dir, &readme_file_name(info.project), contents.as_bytes())
            .await
    }
}

async fn create_dir(path: &Path) -> std::io::Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(PROJECT_DIR_MODE);
    builder.create(path).await
}

/// Serialize a data dictionary as CSV
///
/// # Errors
///
/// Returns `TabulaError::Serialization` if a row cannot be encoded.
pub fn dictionary_csv(dictionary: &DataDictionary) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(["field_name", "form_name", "field_type", "field_label", "identifier"])?;
    for field in dictionary.fields() {
        writer.write_record([
            field.field_name.as_str(),
            field.form_name.as_str(),
            field.field_type.as_str(),
            field.field_label.as_str(),
            if field.identifier { "y" } else { "" },
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| crate::domain::TabulaError::Serialization(format!("CSV error: {e}")))
}
