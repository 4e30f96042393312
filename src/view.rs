//! Hierarchical view projection.
//!
//! Turns the flat task collection into the ordered, depth-annotated row
//! sequence both UIs render. Projection is a pure read: orphans are presented
//! as roots here, but the durable fix lives in
//! [`Database::repair_orphans`](crate::db::Database::repair_orphans).

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::fields::{Priority, Status, TaskType};
use crate::task::Task;

/// One renderable row of the hierarchical task list.
///
/// `key` is the stable identity used to keep the cursor on the same task
/// across rebuilds; `depth` drives the two-space title indentation.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub key: Uuid,
    pub display_id: u64,
    pub depth: usize,
    pub title: String,
    pub status: Status,
    pub priority: Priority,
    pub task_type: TaskType,
    pub parent_id: Option<Uuid>,
}

impl DisplayRow {
    /// The title with two spaces of indentation per depth level.
    pub fn indented_title(&self) -> String {
        format!("{}{}", "  ".repeat(self.depth), self.title)
    }
}

/// Project `tasks` into hierarchy order, optionally filtered by type.
///
/// Children sort by ascending creation time, with insertion order breaking
/// ties. A task whose parent id matches nothing in the collection is treated
/// as a root and its row shows no parent. The type filter removes rows after
/// the tree is built, so a surviving child keeps the depth it had under its
/// filtered-out ancestor.
pub fn project(tasks: &[Task], filter: Option<TaskType>) -> Vec<DisplayRow> {
    let ids: HashSet<Uuid> = tasks.iter().map(|t| t.id).collect();

    // Child lists keyed by effective parent; orphans land in the root bucket.
    let mut children: HashMap<Option<Uuid>, Vec<&Task>> = HashMap::new();
    let mut orphans: HashSet<Uuid> = HashSet::new();
    for task in tasks {
        let bucket = match task.parent_id {
            Some(parent) if ids.contains(&parent) => Some(parent),
            Some(_) => {
                orphans.insert(task.id);
                None
            }
            None => None,
        };
        children.entry(bucket).or_default().push(task);
    }
    for list in children.values_mut() {
        // Stable sort: equal timestamps keep insertion order.
        list.sort_by_key(|t| t.created_at);
    }

    let mut rows = Vec::with_capacity(tasks.len());
    let mut visited: HashSet<Uuid> = HashSet::new();
    emit_subtree(None, 0, &children, &orphans, &mut visited, &mut rows);

    if let Some(task_type) = filter {
        rows.retain(|row| row.task_type == task_type);
    }
    rows
}

fn emit_subtree(
    parent: Option<Uuid>,
    depth: usize,
    children: &HashMap<Option<Uuid>, Vec<&Task>>,
    orphans: &HashSet<Uuid>,
    visited: &mut HashSet<Uuid>,
    rows: &mut Vec<DisplayRow>,
) {
    let Some(list) = children.get(&parent) else {
        return;
    };
    for task in list {
        // The visited set guards against malformed cycles re-emitting a task.
        if !visited.insert(task.id) {
            continue;
        }
        rows.push(DisplayRow {
            key: task.id,
            display_id: task.display_id,
            depth,
            title: task.title.clone(),
            status: task.status,
            priority: task.priority,
            task_type: task.task_type,
            parent_id: if orphans.contains(&task.id) {
                None
            } else {
                task.parent_id
            },
        });
        emit_subtree(Some(task.id), depth + 1, children, orphans, visited, rows);
    }
}

/// Re-resolve the cursor after a rebuild.
///
/// Keeps the row whose key matches the previous selection; otherwise falls
/// back to the first row, or to no selection when the sequence is empty.
pub fn resolve_selection(rows: &[DisplayRow], previous: Option<&Uuid>) -> Option<usize> {
    if let Some(key) = previous {
        if let Some(idx) = rows.iter().position(|row| row.key == *key) {
            return Some(idx);
        }
    }
    if rows.is_empty() {
        None
    } else {
        Some(0)
    }
}
