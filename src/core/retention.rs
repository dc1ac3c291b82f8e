//! Retention pruning for rolling output files

use crate::domain::context::ResultExt;
use crate::domain::Result;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

/// Delete every file in `dir` with extension `extension` except the most
/// recently modified one
///
/// Only regular files directly inside `dir` are considered; the extension
/// match is case-sensitive and given without the dot. Returns the deleted
/// paths, oldest first. A missing directory prunes nothing.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed or a file cannot be
/// removed.
pub async fn prune_all_but_newest(dir: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();

    if let Err(err) = fs::metadata(dir).await {
        if err.kind() == std::io::ErrorKind::NotFound {
            return Ok(Vec::new());
        }
        return Err(err).with_context(|| format!("Failed to inspect {}", dir.display()));
    }

    let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((modified, path));
    }

    // Ties on mtime are broken by name so the result is deterministic.
    candidates.sort();
    candidates.pop();

    let mut deleted = Vec::with_capacity(candidates.len());
    for (_, path) in candidates {
        fs::remove_file(&path)
            .await
            .with_context(|| format!("Failed to remove {}", path.display()))?;
        tracing::info!(path = %path.display(), "Pruned old file");
        deleted.push(path);
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str, mtime: i64) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, name).unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_keeps_only_newest() {
        let dir = tempdir().unwrap();
        let oldest = touch(dir.path(), "a.log", 1_000);
        let middle = touch(dir.path(), "b.log", 2_000);
        let newest = touch(dir.path(), "c.log", 3_000);

        let deleted = prune_all_but_newest(dir.path(), "log").await.unwrap();

        assert_eq!(deleted, vec![oldest.clone(), middle.clone()]);
        assert!(!oldest.exists());
        assert!(!middle.exists());
        assert!(newest.exists());
    }

    #[tokio::test]
    async fn test_other_extensions_and_directories_untouched() {
        let dir = tempdir().unwrap();
        let csv = touch(dir.path(), "all.csv", 1_000);
        let only_log = touch(dir.path(), "run.log", 500);
        std::fs::create_dir(dir.path().join("nested.log")).unwrap();

        let deleted = prune_all_but_newest(dir.path(), "log").await.unwrap();

        assert!(deleted.is_empty());
        assert!(csv.exists());
        assert!(only_log.exists());
        assert!(dir.path().join("nested.log").is_dir());
    }

    #[tokio::test]
    async fn test_missing_directory_prunes_nothing() {
        let dir = tempdir().unwrap();
        let deleted = prune_all_but_newest(dir.path().join("absent"), "log")
            .await
            .unwrap();
        assert!(deleted.is_empty());
    }
}
