//! The task repository.
//!
//! `Database` owns the authoritative in-memory task collection for the process
//! lifetime, backed by one JSON file. Every recognized mutation persists the
//! whole collection synchronously before returning, so callers always observe
//! persisted state.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::store::{self, LoadResult};
use crate::task::{NewTask, Task, TaskPatch};

/// In-memory task collection bound to its backing file.
#[derive(Debug)]
pub struct Database {
    tasks: Vec<Task>,
    next_display_id: u64,
    path: PathBuf,
    degraded: bool,
}

impl Database {
    /// Open the database at `path`, loading whatever the store can provide.
    ///
    /// The next display id picks up one past the highest id ever loaded, so
    /// display ids are never reused even after deletions.
    pub fn open(path: &Path) -> Self {
        let LoadResult { tasks, degraded } = store::load_tasks(path);
        let next_display_id = tasks.iter().map(|t| t.display_id).max().unwrap_or(0) + 1;
        Database {
            tasks,
            next_display_id,
            path: path.to_path_buf(),
            degraded,
        }
    }

    /// True when the last load fell back to empty because of an error, rather
    /// than the file being absent. The UI uses this to warn instead of
    /// presenting a corrupt store as "no tasks yet".
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// All tasks in creation order. Hierarchy order is the projector's job.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    /// Look up a task by id. Absence is a normal outcome, not an error.
    pub fn get(&self, id: &Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == *id)
    }

    /// Look up a task by its short display id.
    pub fn get_by_display_id(&self, display_id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.display_id == display_id)
    }

    /// Create a task from the caller-supplied fields and persist.
    ///
    /// The id, display id, and timestamps are assigned here and cannot be
    /// influenced by the caller. An empty title is accepted; title validation
    /// belongs to the UI layer.
    pub fn create(&mut self, new: NewTask) -> Uuid {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            display_id: self.next_display_id,
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            task_type: new.task_type,
            parent_id: new.parent_id,
            created_at: now,
            updated_at: now,
        };
        self.next_display_id += 1;
        let id = task.id;
        self.tasks.push(task);
        self.persist();
        id
    }

    /// Apply a partial update. Returns false when no task matches `id`.
    ///
    /// `updated_at` advances and the collection persists only when at least
    /// one field actually changes value; a no-effect patch still returns true
    /// without touching the timestamp or the disk.
    pub fn update(&mut self, id: &Uuid, patch: TaskPatch) -> bool {
        let own_id = *id;
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == own_id) else {
            return false;
        };

        let mut changed = false;
        if let Some(title) = patch.title {
            if task.title != title {
                task.title = title;
                changed = true;
            }
        }
        if let Some(description) = patch.description {
            if task.description != description {
                task.description = description;
                changed = true;
            }
        }
        if let Some(status) = patch.status {
            if task.status != status {
                task.status = status;
                changed = true;
            }
        }
        if let Some(priority) = patch.priority {
            if task.priority != priority {
                task.priority = priority;
                changed = true;
            }
        }
        if let Some(task_type) = patch.task_type {
            if task.task_type != task_type {
                task.task_type = task_type;
                changed = true;
            }
        }
        if let Some(parent_id) = patch.parent_id {
            if parent_id == Some(own_id) {
                warn!(task = %own_id, "refusing to make a task its own parent");
            } else if task.parent_id != parent_id {
                task.parent_id = parent_id;
                changed = true;
            }
        }

        if changed {
            task.updated_at = Utc::now();
            self.persist();
        }
        true
    }

    /// Remove the task with `id`, if present, and persist.
    ///
    /// Children are left untouched: their `parent_id` keeps pointing at the
    /// removed task until the next projection presents them as roots, or until
    /// [`repair_orphans`](Self::repair_orphans) clears the reference durably.
    pub fn delete(&mut self, id: &Uuid) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != *id);
        if self.tasks.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Clear every parent reference that points at a task no longer in the
    /// collection. Idempotent maintenance operation; persists once if anything
    /// changed and returns the number of repaired tasks.
    pub fn repair_orphans(&mut self) -> usize {
        let ids: HashSet<Uuid> = self.tasks.iter().map(|t| t.id).collect();
        let now = Utc::now();
        let mut repaired = 0;
        for task in self.tasks.iter_mut() {
            if let Some(parent) = task.parent_id {
                if !ids.contains(&parent) {
                    warn!(task = %task.id, parent = %parent, "clearing dangling parent reference");
                    task.parent_id = None;
                    task.updated_at = now;
                    repaired += 1;
                }
            }
        }
        if repaired > 0 {
            info!(count = repaired, "repaired orphaned tasks");
            self.persist();
        }
        repaired
    }

    fn persist(&self) {
        store::save_tasks(&self.tasks, &self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Priority, Status, TaskType};
    use pretty_assertions::assert_eq;

    fn open_temp() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("tasks.json"));
        (dir, db)
    }

    fn titled(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            ..NewTask::default()
        }
    }

    #[test]
    fn create_assigns_sequential_display_ids() {
        let (_dir, mut db) = open_temp();
        let a = db.create(titled("first"));
        let b = db.create(titled("second"));
        assert_ne!(a, b);
        assert_eq!(db.get(&a).unwrap().display_id, 1);
        assert_eq!(db.get(&b).unwrap().display_id, 2);
    }

    #[test]
    fn create_applies_defaults_and_timestamps() {
        let (_dir, mut db) = open_temp();
        let id = db.create(titled("defaults"));
        let task = db.get(&id).unwrap();
        assert_eq!(task.status, Status::ToDo);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.task_type, TaskType::Task);
        assert_eq!(task.parent_id, None);
        assert_eq!(task.updated_at, task.created_at);
    }

    #[test]
    fn display_ids_are_never_reused() {
        let (_dir, mut db) = open_temp();
        db.create(titled("one"));
        let top = db.create(titled("two"));
        assert_eq!(db.get(&top).unwrap().display_id, 2);

        assert!(db.delete(&top));
        let next = db.create(titled("three"));
        assert_eq!(db.get(&next).unwrap().display_id, 3);
    }

    #[test]
    fn display_id_counter_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        {
            let mut db = Database::open(&path);
            db.create(titled("one"));
            db.create(titled("two"));
        }
        let mut db = Database::open(&path);
        let id = db.create(titled("three"));
        assert_eq!(db.get(&id).unwrap().display_id, 3);
    }

    #[test]
    fn update_changes_only_requested_fields() {
        let (_dir, mut db) = open_temp();
        let id = db.create(titled("before"));
        let original = db.get(&id).unwrap().clone();

        let ok = db.update(
            &id,
            TaskPatch {
                title: Some("after".to_string()),
                ..TaskPatch::default()
            },
        );
        assert!(ok);

        let task = db.get(&id).unwrap();
        assert_eq!(task.title, "after");
        assert_eq!(task.id, original.id);
        assert_eq!(task.display_id, original.display_id);
        assert_eq!(task.created_at, original.created_at);
        assert_eq!(task.description, original.description);
        assert!(task.updated_at >= original.updated_at);
    }

    #[test]
    fn update_on_missing_id_reports_failure_and_skips_persistence() {
        let (dir, mut db) = open_temp();
        let id = db.create(titled("only"));
        let path = dir.path().join("tasks.json");
        // Removing the file lets us detect any persist call: it would recreate it.
        std::fs::remove_file(&path).unwrap();

        let ok = db.update(&Uuid::new_v4(), TaskPatch::with_status(Status::Done));
        assert!(!ok);
        assert!(!path.exists());
        assert_eq!(db.get(&id).unwrap().status, Status::ToDo);
    }

    #[test]
    fn no_effect_update_succeeds_without_touching_timestamp_or_disk() {
        let (dir, mut db) = open_temp();
        let id = db.create(titled("same"));
        let before = db.get(&id).unwrap().updated_at;
        let path = dir.path().join("tasks.json");
        std::fs::remove_file(&path).unwrap();

        let ok = db.update(
            &id,
            TaskPatch {
                title: Some("same".to_string()),
                status: Some(Status::ToDo),
                ..TaskPatch::default()
            },
        );
        assert!(ok);
        assert_eq!(db.get(&id).unwrap().updated_at, before);
        assert!(!path.exists());
    }

    #[test]
    fn update_refuses_self_parenting() {
        let (_dir, mut db) = open_temp();
        let id = db.create(titled("loop"));
        let ok = db.update(
            &id,
            TaskPatch {
                parent_id: Some(Some(id)),
                ..TaskPatch::default()
            },
        );
        assert!(ok);
        assert_eq!(db.get(&id).unwrap().parent_id, None);
    }

    #[test]
    fn delete_keeps_children_with_dangling_parent() {
        let (_dir, mut db) = open_temp();
        let parent = db.create(titled("parent"));
        let child = db.create(NewTask {
            title: "child".to_string(),
            parent_id: Some(parent),
            ..NewTask::default()
        });

        assert!(db.delete(&parent));
        assert!(db.get(&parent).is_none());
        assert_eq!(db.get(&child).unwrap().parent_id, Some(parent));
    }

    #[test]
    fn delete_on_missing_id_reports_failure_and_skips_persistence() {
        let (dir, mut db) = open_temp();
        db.create(titled("keeper"));
        let path = dir.path().join("tasks.json");
        std::fs::remove_file(&path).unwrap();

        assert!(!db.delete(&Uuid::new_v4()));
        assert!(!path.exists());
        assert_eq!(db.list().len(), 1);
    }

    #[test]
    fn repair_orphans_clears_dangling_parents_once() {
        let (dir, mut db) = open_temp();
        let parent = db.create(titled("parent"));
        let child = db.create(NewTask {
            title: "child".to_string(),
            parent_id: Some(parent),
            ..NewTask::default()
        });
        db.delete(&parent);

        assert_eq!(db.repair_orphans(), 1);
        assert_eq!(db.get(&child).unwrap().parent_id, None);

        // Second pass finds nothing and must not rewrite the file.
        let path = dir.path().join("tasks.json");
        std::fs::remove_file(&path).unwrap();
        assert_eq!(db.repair_orphans(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn mutations_are_visible_after_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let id = {
            let mut db = Database::open(&path);
            let id = db.create(titled("durable"));
            db.update(&id, TaskPatch::with_priority(Priority::Critical));
            id
        };
        let db = Database::open(&path);
        assert!(!db.is_degraded());
        assert_eq!(db.get(&id).unwrap().priority, Priority::Critical);
    }
}
