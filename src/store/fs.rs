//! Filesystem-backed step store.
//!
//! One JSON document per `(run, step)` under a root directory:
//! `<root>/<run id>/<step name>.json`. A record is claimed by hard-linking a
//! fully written scratch file into place, which either succeeds atomically or
//! fails because another writer already holds the key.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

use super::StepStore;

/// Step store persisting records as JSON files.
#[derive(Debug, Clone)]
pub struct FsStepStore {
    root: PathBuf,
}

impl FsStepStore {
    /// Creates a store rooted at the given directory.
    ///
    /// The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory holding one run's records.
    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root.join(sanitize(run_id))
    }

    /// Returns the record path for a step.
    fn record_path(&self, run_id: &str, step: &str) -> PathBuf {
        self.run_dir(run_id).join(format!("{}.json", sanitize(step)))
    }

    async fn read_record(&self, path: &Path) -> Result<Value> {
        let raw = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Store(format!("corrupt step record {}: {}", path.display(), e)))
    }
}

/// Maps a run or step name onto a safe file-name component.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl StepStore for FsStepStore {
    async fn load(&self, run_id: &str, step: &str) -> Result<Option<Value>> {
        let path = self.record_path(run_id, step);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(Some(self.read_record(&path).await?)),
            Ok(false) => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    async fn record(&self, run_id: &str, step: &str, payload: Value) -> Result<Value> {
        let dir = self.run_dir(run_id);
        tokio::fs::create_dir_all(&dir).await?;

        // Write the payload to a scratch file first so the link target is
        // never observed half-written.
        let scratch = dir.join(format!(".scratch-{}", uuid::Uuid::new_v4()));
        let raw = serde_json::to_string_pretty(&payload)?;
        tokio::fs::write(&scratch, raw).await?;

        let path = self.record_path(run_id, step);
        let claim = tokio::fs::hard_link(&scratch, &path).await;
        let _ = tokio::fs::remove_file(&scratch).await;

        match claim {
            Ok(()) => Ok(payload),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // Lost the claim: another writer committed first.
                self.read_record(&path).await
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn record_then_load_round_trips() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = FsStepStore::new(dir.path());

        store.record("run", "step", json!({"n": 7})).await.unwrap();
        let loaded = store.load("run", "step").await.unwrap();

        assert_eq!(loaded, Some(json!({"n": 7})));
    }

    #[tokio::test]
    async fn records_survive_a_new_store_instance() {
        let dir = TempDir::new().expect("failed to create temp dir");

        let store = FsStepStore::new(dir.path());
        store.record("run", "step", json!("cached")).await.unwrap();
        drop(store);

        // A fresh store over the same root sees the record, as a resumed
        // process would.
        let reopened = FsStepStore::new(dir.path());
        let loaded = reopened.load("run", "step").await.unwrap();
        assert_eq!(loaded, Some(json!("cached")));
    }

    #[tokio::test]
    async fn first_writer_wins() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = FsStepStore::new(dir.path());

        let first = store.record("run", "step", json!("first")).await.unwrap();
        let second = store.record("run", "step", json!("second")).await.unwrap();

        assert_eq!(first, json!("first"));
        assert_eq!(second, json!("first"));
    }

    #[tokio::test]
    async fn step_names_are_sanitized() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = FsStepStore::new(dir.path());

        store
            .record("run/one", "tool:read files", json!(1))
            .await
            .unwrap();

        let loaded = store.load("run/one", "tool:read files").await.unwrap();
        assert_eq!(loaded, Some(json!(1)));
        assert!(dir.path().join("run_one").is_dir());
    }

    #[tokio::test]
    async fn no_scratch_files_left_behind() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = FsStepStore::new(dir.path());

        store.record("run", "a", json!(1)).await.unwrap();
        store.record("run", "a", json!(2)).await.unwrap();

        let mut entries = tokio::fs::read_dir(dir.path().join("run")).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["a.json".to_string()]);
    }
}
