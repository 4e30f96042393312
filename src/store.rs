//! Durable storage for the task collection.
//!
//! Tasks persist as a single JSON array, written whole-file on every mutation.
//! Failures never propagate past this module: saves log and leave the previous
//! file untouched, loads log and fall back to an empty collection with the
//! `degraded` flag set so callers can tell a corrupt store from an empty one.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use crate::task::Task;

/// A storage failure, contained at this boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid task data in {path}: {reason}")]
    Format { path: String, reason: String },
}

/// Outcome of a load: the tasks plus whether the store fell back to empty
/// because of an error (as opposed to the file simply not existing yet).
#[derive(Debug, Default)]
pub struct LoadResult {
    pub tasks: Vec<Task>,
    pub degraded: bool,
}

/// Load the task collection from `path`.
///
/// A missing file is a normal first run and yields an empty collection. Any
/// read or parse failure is logged once and also yields an empty collection,
/// with `degraded` set.
pub fn load_tasks(path: &Path) -> LoadResult {
    if !path.exists() {
        return LoadResult::default();
    }
    match try_load(path) {
        Ok(tasks) => {
            debug!(path = %path.display(), count = tasks.len(), "loaded tasks");
            LoadResult {
                tasks,
                degraded: false,
            }
        }
        Err(e) => {
            error!("failed to load tasks: {e}");
            LoadResult {
                tasks: Vec::new(),
                degraded: true,
            }
        }
    }
}

fn try_load(path: &Path) -> Result<Vec<Task>, StoreError> {
    let mut buf = String::new();
    File::open(path)
        .and_then(|mut f| f.read_to_string(&mut buf))
        .map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let records: Vec<Value> = serde_json::from_str(&buf).map_err(|e| StoreError::Format {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let mut tasks = Vec::with_capacity(records.len());
    for record in records {
        // Null entries are leftovers from hand-edited files; skip them.
        if record.is_null() {
            continue;
        }
        let task: Task = serde_json::from_value(record).map_err(|e| StoreError::Format {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tasks.push(task);
    }
    Ok(tasks)
}

/// Save the whole task collection to `path`.
///
/// Errors are logged, not returned; the next successful mutation will try
/// again with the then-current state.
pub fn save_tasks(tasks: &[Task], path: &Path) {
    if let Err(e) = try_save(tasks, path) {
        error!("failed to save tasks: {e}");
    }
}

fn try_save(tasks: &[Task], path: &Path) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.display().to_string(),
        source,
    };
    let data = serde_json::to_string_pretty(tasks).map_err(|e| StoreError::Format {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    // Atomic-ish write via temp + rename.
    let tmp = path.with_extension("json.tmp");
    let mut f = File::create(&tmp).map_err(io_err)?;
    f.write_all(data.as_bytes()).map_err(io_err)?;
    f.flush().map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    debug!(path = %path.display(), count = tasks.len(), "saved tasks");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Priority, Status, TaskType};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn sample_task(display_id: u64, title: &str) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            display_id,
            title: title.to_string(),
            description: String::new(),
            status: Status::InProgress,
            priority: Priority::Critical,
            task_type: TaskType::Story,
            parent_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn round_trip_preserves_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let mut child = sample_task(2, "child");
        let parent = sample_task(1, "parent");
        child.parent_id = Some(parent.id);
        let tasks = vec![parent, child];

        save_tasks(&tasks, &path);
        let loaded = load_tasks(&path);

        assert!(!loaded.degraded);
        assert_eq!(loaded.tasks, tasks);
    }

    #[test]
    fn missing_file_loads_empty_without_degrading() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_tasks(&dir.path().join("nope.json"));
        assert!(result.tasks.is_empty());
        assert!(!result.degraded);
    }

    #[test]
    fn malformed_json_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "not valid json{").unwrap();

        let result = load_tasks(&path);
        assert!(result.tasks.is_empty());
        assert!(result.degraded);
    }

    #[test]
    fn record_missing_required_fields_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, r#"[{"title": "no id or timestamps"}]"#).unwrap();

        let result = load_tasks(&path);
        assert!(result.tasks.is_empty());
        assert!(result.degraded);
    }

    #[test]
    fn null_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let task = sample_task(1, "kept");
        let json = format!(
            "[null, {}, null]",
            serde_json::to_string(&task).unwrap()
        );
        fs::write(&path, json).unwrap();

        let result = load_tasks(&path);
        assert!(!result.degraded);
        assert_eq!(result.tasks, vec![task]);
    }

    #[test]
    fn failed_save_leaves_previous_file_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let tasks = vec![sample_task(1, "original")];
        save_tasks(&tasks, &path);

        // A directory at the rename target makes the save fail after the temp
        // write; the original file must survive.
        let blocked = dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        save_tasks(&[sample_task(2, "doomed")], &blocked);

        let reloaded = load_tasks(&path);
        assert_eq!(reloaded.tasks, tasks);
    }
}
