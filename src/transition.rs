//! Keyboard-driven field cycling.
//!
//! Steps a task's status or priority to the adjacent value in its fixed cycle
//! and hands the write to the repository, which handles change detection,
//! timestamping, and persistence.

use uuid::Uuid;

use crate::db::Database;
use crate::fields::{Priority, Status};
use crate::task::TaskPatch;

/// Advance a task's status one step through the cycle
/// To Do → In Progress → Done → Blocked → To Do, or the reverse.
///
/// Returns the new status, or None when no task matches `id`.
pub fn advance_status(db: &mut Database, id: &Uuid, reverse: bool) -> Option<Status> {
    let current = db.get(id)?.status;
    let next = if reverse { current.prev() } else { current.next() };
    db.update(id, TaskPatch::with_status(next));
    Some(next)
}

/// Advance a task's priority one step through Low → Medium → High → Critical,
/// wrapping Critical back to Low.
///
/// Returns the new priority, or None when no task matches `id`.
pub fn advance_priority(db: &mut Database, id: &Uuid) -> Option<Priority> {
    let current = db.get(id)?.priority;
    let next = current.next();
    db.update(id, TaskPatch::with_priority(next));
    Some(next)
}
