//! Enumerations and field types for task management.
//!
//! This module defines the closed value sets used to categorise tasks (status,
//! priority, and task type) along with their display labels and the fixed cycles
//! used for keyboard-driven stepping.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Workflow status of a task.
///
/// The variant order is the status cycle: To Do → In Progress → Done → Blocked,
/// wrapping around in both directions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
pub enum Status {
    #[serde(rename = "To Do")]
    #[value(name = "todo")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
    Blocked,
}

impl Default for Status {
    fn default() -> Self {
        Status::ToDo
    }
}

impl Status {
    /// Every status in cycle order.
    pub const ALL: [Status; 4] = [
        Status::ToDo,
        Status::InProgress,
        Status::Done,
        Status::Blocked,
    ];

    /// The next status in the cycle, wrapping Blocked back to To Do.
    pub fn next(self) -> Status {
        match self {
            Status::ToDo => Status::InProgress,
            Status::InProgress => Status::Done,
            Status::Done => Status::Blocked,
            Status::Blocked => Status::ToDo,
        }
    }

    /// The previous status in the cycle, wrapping To Do back to Blocked.
    pub fn prev(self) -> Status {
        match self {
            Status::ToDo => Status::Blocked,
            Status::InProgress => Status::ToDo,
            Status::Done => Status::InProgress,
            Status::Blocked => Status::Done,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::ToDo => "To Do",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
            Status::Blocked => "Blocked",
        }
    }
}

/// Priority level of a task.
///
/// Variant order is the priority cycle: Low → Medium → High → Critical, wrapping
/// Critical back to Low.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Priority {
    /// Every priority in cycle order.
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    /// The next priority in the cycle, wrapping Critical back to Low.
    pub fn next(self) -> Priority {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Critical,
            Priority::Critical => Priority::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

/// Agile classification of a work item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
pub enum TaskType {
    Epic,
    Story,
    Task,
    Bug,
}

impl Default for TaskType {
    fn default() -> Self {
        TaskType::Task
    }
}

impl TaskType {
    /// Every task type, in the order used by the numeric filter keys.
    pub const ALL: [TaskType; 4] = [TaskType::Epic, TaskType::Story, TaskType::Task, TaskType::Bug];

    pub fn label(self) -> &'static str {
        match self {
            TaskType::Epic => "Epic",
            TaskType::Story => "Story",
            TaskType::Task => "Task",
            TaskType::Bug => "Bug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_cycle_wraps_forward() {
        assert_eq!(Status::Blocked.next(), Status::ToDo);
        assert_eq!(Status::ToDo.next(), Status::InProgress);
    }

    #[test]
    fn status_cycle_wraps_backward() {
        assert_eq!(Status::ToDo.prev(), Status::Blocked);
        assert_eq!(Status::InProgress.prev(), Status::ToDo);
    }

    #[test]
    fn priority_cycle_wraps() {
        assert_eq!(Priority::Critical.next(), Priority::Low);
        assert_eq!(Priority::Low.next(), Priority::Medium);
    }

    #[test]
    fn prev_inverts_next() {
        for s in Status::ALL {
            assert_eq!(s.next().prev(), s);
        }
    }

    #[test]
    fn enums_serialize_to_literal_names() {
        assert_eq!(serde_json::to_string(&Status::ToDo).unwrap(), "\"To Do\"");
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            "\"In Progress\""
        );
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"High\"");
        assert_eq!(serde_json::to_string(&TaskType::Bug).unwrap(), "\"Bug\"");
    }

    #[test]
    fn unknown_literal_is_rejected() {
        assert!(serde_json::from_str::<Status>("\"Paused\"").is_err());
    }
}
