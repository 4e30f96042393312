//! Add/edit form state for the terminal user interface.
//!
//! The form holds text fields for title and description plus index-based
//! selectors over the closed enum sets and the parent candidates. Field order
//! constants drive both focus movement and rendering.

use uuid::Uuid;

use crate::fields::{Priority, Status, TaskType};
use crate::task::{NewTask, Task, TaskPatch};
use crate::tui::input::InputField;

/// Field order within the form.
pub const TITLE_FIELD: usize = 0;
pub const DESCRIPTION_FIELD: usize = 1;
pub const STATUS_FIELD: usize = 2;
pub const PRIORITY_FIELD: usize = 3;
pub const TYPE_FIELD: usize = 4;
pub const PARENT_FIELD: usize = 5;
pub const FIELD_COUNT: usize = 6;

/// One selectable parent option.
pub struct ParentChoice {
    pub id: Option<Uuid>,
    pub label: String,
}

/// Form state for adding or editing a task.
pub struct TaskForm {
    pub title: InputField,
    pub description: InputField,
    pub status: usize,
    pub priority: usize,
    pub task_type: usize,
    pub parent: usize,
    pub parents: Vec<ParentChoice>,
    pub current_field: usize,
}

impl TaskForm {
    /// An empty form for adding a task; every task is a parent candidate.
    pub fn new(tasks: &[Task]) -> Self {
        TaskForm {
            title: InputField::new(),
            description: InputField::new(),
            status: position_of(&Status::ALL, Status::default()),
            priority: position_of(&Priority::ALL, Priority::default()),
            task_type: position_of(&TaskType::ALL, TaskType::default()),
            parent: 0,
            parents: parent_choices(tasks, None),
            current_field: TITLE_FIELD,
        }
    }

    /// A form pre-filled from an existing task. The task itself is excluded
    /// from the parent candidates so it cannot become its own parent.
    pub fn from_task(task: &Task, tasks: &[Task]) -> Self {
        let parents = parent_choices(tasks, Some(task.id));
        let parent = task
            .parent_id
            .and_then(|p| parents.iter().position(|c| c.id == Some(p)))
            .unwrap_or(0);
        TaskForm {
            title: InputField::with_value(&task.title),
            description: InputField::with_value(&task.description),
            status: position_of(&Status::ALL, task.status),
            priority: position_of(&Priority::ALL, task.priority),
            task_type: position_of(&TaskType::ALL, task.task_type),
            parent,
            parents,
            current_field: TITLE_FIELD,
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
    }

    /// True when the focused field takes text input.
    pub fn in_text_field(&self) -> bool {
        matches!(self.current_field, TITLE_FIELD | DESCRIPTION_FIELD)
    }

    /// The text field currently focused, if any.
    pub fn active_text_field(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TITLE_FIELD => Some(&mut self.title),
            DESCRIPTION_FIELD => Some(&mut self.description),
            _ => None,
        }
    }

    /// Step the focused selector field forward or backward.
    pub fn cycle_option(&mut self, forward: bool) {
        let step = |index: usize, len: usize| {
            if forward {
                (index + 1) % len
            } else {
                (index + len - 1) % len
            }
        };
        match self.current_field {
            STATUS_FIELD => self.status = step(self.status, Status::ALL.len()),
            PRIORITY_FIELD => self.priority = step(self.priority, Priority::ALL.len()),
            TYPE_FIELD => self.task_type = step(self.task_type, TaskType::ALL.len()),
            PARENT_FIELD => {
                if !self.parents.is_empty() {
                    self.parent = step(self.parent, self.parents.len());
                }
            }
            _ => {}
        }
    }

    pub fn selected_status(&self) -> Status {
        Status::ALL[self.status]
    }

    pub fn selected_priority(&self) -> Priority {
        Priority::ALL[self.priority]
    }

    pub fn selected_type(&self) -> TaskType {
        TaskType::ALL[self.task_type]
    }

    pub fn selected_parent(&self) -> Option<Uuid> {
        self.parents.get(self.parent).and_then(|c| c.id)
    }

    pub fn selected_parent_label(&self) -> &str {
        self.parents
            .get(self.parent)
            .map(|c| c.label.as_str())
            .unwrap_or("-")
    }

    /// The creation request for the current form contents.
    pub fn to_new_task(&self) -> NewTask {
        NewTask {
            title: self.title.value.clone(),
            description: self.description.value.clone(),
            status: self.selected_status(),
            priority: self.selected_priority(),
            task_type: self.selected_type(),
            parent_id: self.selected_parent(),
        }
    }

    /// The update patch for the current form contents. Every mutable field is
    /// present; the repository's change detection keeps untouched values from
    /// bumping `updated_at`.
    pub fn to_patch(&self) -> TaskPatch {
        TaskPatch {
            title: Some(self.title.value.clone()),
            description: Some(self.description.value.clone()),
            status: Some(self.selected_status()),
            priority: Some(self.selected_priority()),
            task_type: Some(self.selected_type()),
            parent_id: Some(self.selected_parent()),
        }
    }
}

fn position_of<T: PartialEq + Copy>(all: &[T], value: T) -> usize {
    all.iter().position(|v| *v == value).unwrap_or(0)
}

fn parent_choices(tasks: &[Task], exclude: Option<Uuid>) -> Vec<ParentChoice> {
    let mut choices = vec![ParentChoice {
        id: None,
        label: "-".to_string(),
    }];
    for task in tasks {
        if Some(task.id) == exclude {
            continue;
        }
        choices.push(ParentChoice {
            id: Some(task.id),
            label: format!("[{}] {}", task.display_id, task.title),
        });
    }
    choices
}
