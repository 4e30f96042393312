//! Task data structure and related functionality.
//!
//! This module defines the core `Task` struct that represents a single work item,
//! the partial types used to create and patch tasks through the repository, and
//! the timestamp normalization applied when records are read back from disk.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::fields::{Priority, Status, TaskType};

/// A single work item.
///
/// Tasks form a forest via `parent_id`; the reference does not imply ownership, so
/// a parent may be deleted while its children remain. Instances are only created
/// and mutated through the [`Database`](crate::db::Database).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord")]
pub struct Task {
    pub id: Uuid,
    pub display_id: u64,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub task_type: TaskType,
    pub parent_id: Option<Uuid>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Fields a caller may supply when creating a task.
///
/// Identifier and timestamp fields are deliberately absent: the repository
/// assigns them and a caller cannot override them.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub task_type: TaskType,
    pub parent_id: Option<Uuid>,
}

/// A partial update over the mutable fields of a task.
///
/// `None` leaves a field untouched. `parent_id` is doubly optional so that
/// "clear the parent" (`Some(None)`) and "leave the parent alone" (`None`) stay
/// distinct. Immutable fields (`id`, `display_id`, `created_at`) cannot be
/// expressed here at all.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub task_type: Option<TaskType>,
    pub parent_id: Option<Option<Uuid>>,
}

impl TaskPatch {
    /// A patch that only moves the status.
    pub fn with_status(status: Status) -> Self {
        TaskPatch {
            status: Some(status),
            ..TaskPatch::default()
        }
    }

    /// A patch that only moves the priority.
    pub fn with_priority(priority: Priority) -> Self {
        TaskPatch {
            priority: Some(priority),
            ..TaskPatch::default()
        }
    }
}

/// A task record as it appears on disk, before normalization.
///
/// Timestamps are kept as raw strings here so that legacy records without a UTC
/// offset can still be parsed, and a missing `updated_at` can fall back to
/// `created_at`.
#[derive(Deserialize)]
struct TaskRecord {
    id: Uuid,
    display_id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    status: Status,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    task_type: TaskType,
    #[serde(default)]
    parent_id: Option<Uuid>,
    created_at: String,
    #[serde(default)]
    updated_at: Option<String>,
}

/// A record field that cannot be normalized into a valid task.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unparseable timestamp {0:?}")]
    Timestamp(String),
    #[error("display_id must be a positive integer")]
    DisplayId,
}

impl TryFrom<TaskRecord> for Task {
    type Error = RecordError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        if record.display_id == 0 {
            return Err(RecordError::DisplayId);
        }
        let created_at = parse_timestamp(&record.created_at)?;
        let updated_at = match record.updated_at {
            Some(raw) => parse_timestamp(&raw)?,
            None => created_at,
        };
        Ok(Task {
            id: record.id,
            display_id: record.display_id,
            title: record.title,
            description: record.description,
            status: record.status,
            priority: record.priority,
            task_type: record.task_type,
            parent_id: record.parent_id,
            created_at,
            updated_at,
        })
    }
}

/// Parse an ISO-8601 timestamp. Strings without a UTC offset come from legacy
/// records and are taken as UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RecordError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(RecordError::Timestamp(raw.to_string()))
}

/// Serialize a timestamp as RFC 3339 with an explicit UTC offset.
fn serialize_timestamp<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&dt.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_record_takes_documented_defaults() {
        let json = r#"{
            "id": "2f9a4b56-1111-2222-3333-444455556666",
            "display_id": 7,
            "created_at": "2024-03-01T09:30:00+00:00"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.display_id, 7);
        assert_eq!(task.title, "");
        assert_eq!(task.description, "");
        assert_eq!(task.status, Status::ToDo);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.task_type, TaskType::Task);
        assert_eq!(task.parent_id, None);
        assert_eq!(task.updated_at, task.created_at);
    }

    #[test]
    fn offsetless_timestamp_is_read_as_utc() {
        let json = r#"{
            "id": "2f9a4b56-1111-2222-3333-444455556666",
            "display_id": 1,
            "created_at": "2024-03-01T09:30:00.250000"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.created_at.to_rfc3339(), "2024-03-01T09:30:00.250+00:00");
    }

    #[test]
    fn explicit_offset_is_converted_to_utc() {
        let json = r#"{
            "id": "2f9a4b56-1111-2222-3333-444455556666",
            "display_id": 1,
            "created_at": "2024-03-01T10:30:00+01:00"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.created_at.to_rfc3339(), "2024-03-01T09:30:00+00:00");
    }

    #[test]
    fn serialized_timestamps_carry_a_utc_offset() {
        let json = r#"{
            "id": "2f9a4b56-1111-2222-3333-444455556666",
            "display_id": 1,
            "created_at": "2024-03-01T09:30:00"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        let out = serde_json::to_string(&task).unwrap();
        assert!(out.contains("\"created_at\":\"2024-03-01T09:30:00+00:00\""));
        assert!(out.contains("\"updated_at\":\"2024-03-01T09:30:00+00:00\""));
    }

    #[test]
    fn zero_display_id_is_rejected() {
        let json = r#"{
            "id": "2f9a4b56-1111-2222-3333-444455556666",
            "display_id": 0,
            "created_at": "2024-03-01T09:30:00+00:00"
        }"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn unknown_enum_literal_fails_decode() {
        let json = r#"{
            "id": "2f9a4b56-1111-2222-3333-444455556666",
            "display_id": 1,
            "status": "Paused",
            "created_at": "2024-03-01T09:30:00+00:00"
        }"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn round_trip_preserves_subsecond_precision() {
        let json = r#"{
            "id": "2f9a4b56-1111-2222-3333-444455556666",
            "display_id": 3,
            "title": "Tune parser",
            "status": "In Progress",
            "priority": "High",
            "task_type": "Bug",
            "created_at": "2024-03-01T09:30:00.123456+00:00",
            "updated_at": "2024-03-02T18:00:01.654321+00:00"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        let encoded = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&encoded).unwrap();
        assert_eq!(task, decoded);
    }
}
