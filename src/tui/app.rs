//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which manages the TUI state, handles
//! user input, renders the interface, and coordinates between the task list,
//! the add/edit form, and the delete confirmation overlay.

use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use uuid::Uuid;

use crate::db::Database;
use crate::fields::TaskType;
use crate::transition::{advance_priority, advance_status};
use crate::tui::colors::{priority_color, status_style};
use crate::tui::form::{
    TaskForm, DESCRIPTION_FIELD, PARENT_FIELD, PRIORITY_FIELD, STATUS_FIELD, TITLE_FIELD,
    TYPE_FIELD,
};
use crate::view::{project, resolve_selection, DisplayRow};

/// Screens of the terminal user interface.
#[derive(Debug, Clone, Copy, PartialEq)]
enum AppState {
    List,
    Add,
    Edit,
    ConfirmDelete,
}

/// Main application state for the terminal user interface.
pub struct App {
    state: AppState,
    db: Database,
    rows: Vec<DisplayRow>,
    table_state: TableState,
    selected: Option<Uuid>,
    filter: Option<TaskType>,
    form: TaskForm,
    editing: Option<Uuid>,
    status_message: String,
}

impl App {
    /// Create a new App instance, loading the database from the specified path.
    pub fn new(db_path: &Path) -> Self {
        let db = Database::open(db_path);
        let mut app = App {
            state: AppState::List,
            db,
            rows: Vec::new(),
            table_state: TableState::default(),
            selected: None,
            filter: None,
            form: TaskForm::new(&[]),
            editing: None,
            status_message: String::new(),
        };
        app.rebuild_rows();
        app
    }

    /// Re-project the task list and restore the cursor by stable row key.
    fn rebuild_rows(&mut self) {
        self.rows = project(self.db.list(), self.filter);
        let idx = resolve_selection(&self.rows, self.selected.as_ref());
        self.table_state.select(idx);
        self.selected = idx.map(|i| self.rows[i].key);
    }

    fn select_index(&mut self, idx: usize) {
        self.table_state.select(Some(idx));
        self.selected = self.rows.get(idx).map(|r| r.key);
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    /// Poll for one input event and dispatch it. Returns true to quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(false);
                }
                self.status_message.clear();
                let should_quit = match self.state {
                    AppState::List => self.handle_list_input(key.code),
                    AppState::Add | AppState::Edit => self.handle_form_input(key.code),
                    AppState::ConfirmDelete => self.handle_confirm_input(key.code),
                };
                return Ok(should_quit);
            }
        }
        Ok(false)
    }

    fn handle_list_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                if let Some(selected) = self.table_state.selected() {
                    if selected > 0 {
                        self.select_index(selected - 1);
                    }
                } else if !self.rows.is_empty() {
                    self.select_index(0);
                }
            }
            KeyCode::Down => {
                if let Some(selected) = self.table_state.selected() {
                    if selected + 1 < self.rows.len() {
                        self.select_index(selected + 1);
                    }
                } else if !self.rows.is_empty() {
                    self.select_index(0);
                }
            }
            KeyCode::Char('a') => {
                self.form = TaskForm::new(self.db.list());
                self.editing = None;
                self.state = AppState::Add;
            }
            KeyCode::Char('e') => {
                if let Some(task) = self.selected.and_then(|id| self.db.get(&id)) {
                    self.form = TaskForm::from_task(task, self.db.list());
                    self.editing = Some(task.id);
                    self.state = AppState::Edit;
                } else {
                    self.set_status_message("No task selected to edit".to_string());
                }
            }
            KeyCode::Char('d') => {
                if self.selected.is_some() {
                    self.state = AppState::ConfirmDelete;
                } else {
                    self.set_status_message("No task selected to delete".to_string());
                }
            }
            KeyCode::Char('s') => {
                if let Some(id) = self.selected {
                    if let Some(status) = advance_status(&mut self.db, &id, false) {
                        self.set_status_message(format!("Status updated to {}", status.label()));
                        self.rebuild_rows();
                    }
                } else {
                    self.set_status_message("No task selected to cycle status".to_string());
                }
            }
            KeyCode::Char('S') => {
                if let Some(id) = self.selected {
                    if let Some(status) = advance_status(&mut self.db, &id, true) {
                        self.set_status_message(format!("Status updated to {}", status.label()));
                        self.rebuild_rows();
                    }
                } else {
                    self.set_status_message("No task selected to cycle status".to_string());
                }
            }
            KeyCode::Char('+') => {
                if let Some(id) = self.selected {
                    if let Some(priority) = advance_priority(&mut self.db, &id) {
                        self.set_status_message(format!(
                            "Priority updated to {}",
                            priority.label()
                        ));
                        self.rebuild_rows();
                    }
                } else {
                    self.set_status_message("No task selected to cycle priority".to_string());
                }
            }
            KeyCode::Char(c @ '0'..='4') => {
                self.filter = match c {
                    '1' => Some(TaskType::Epic),
                    '2' => Some(TaskType::Story),
                    '3' => Some(TaskType::Task),
                    '4' => Some(TaskType::Bug),
                    _ => None,
                };
                self.rebuild_rows();
                self.set_status_message(match self.filter {
                    Some(ty) => format!("Filter: {}", ty.label()),
                    None => "Filter: All".to_string(),
                });
            }
            KeyCode::Char('r') => {
                let repaired = self.db.repair_orphans();
                self.rebuild_rows();
                self.set_status_message(if repaired == 0 {
                    "No orphaned tasks".to_string()
                } else {
                    format!("Repaired {repaired} orphaned task(s)")
                });
            }
            _ => {}
        }
        false
    }

    fn handle_form_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Esc => {
                let cancelled = if self.state == AppState::Add {
                    "Add cancelled"
                } else {
                    "Edit cancelled"
                };
                self.state = AppState::List;
                self.set_status_message(cancelled.to_string());
            }
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab | KeyCode::Down => self.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.form.prev_field(),
            KeyCode::Left => {
                if self.form.in_text_field() {
                    if let Some(field) = self.form.active_text_field() {
                        field.left();
                    }
                } else {
                    self.form.cycle_option(false);
                }
            }
            KeyCode::Right => {
                if self.form.in_text_field() {
                    if let Some(field) = self.form.active_text_field() {
                        field.right();
                    }
                } else {
                    self.form.cycle_option(true);
                }
            }
            KeyCode::Backspace => {
                if let Some(field) = self.form.active_text_field() {
                    field.backspace();
                }
            }
            KeyCode::Delete => {
                if let Some(field) = self.form.active_text_field() {
                    field.delete();
                }
            }
            KeyCode::Char(c) => {
                if let Some(field) = self.form.active_text_field() {
                    field.insert(c);
                }
            }
            _ => {}
        }
        false
    }

    /// Validate and apply the form. Title emptiness is enforced here, not in
    /// the repository.
    fn submit_form(&mut self) {
        if self.form.title.value.trim().is_empty() {
            self.set_status_message("Title is required".to_string());
            return;
        }
        match self.editing {
            None => {
                let id = self.db.create(self.form.to_new_task());
                self.selected = Some(id);
                self.set_status_message(format!("Added task '{}'", self.form.title.value));
            }
            Some(id) => {
                if self.db.update(&id, self.form.to_patch()) {
                    self.set_status_message(format!("Task '{}' updated", self.form.title.value));
                } else {
                    self.set_status_message("Task no longer exists".to_string());
                }
            }
        }
        self.state = AppState::List;
        self.rebuild_rows();
    }

    fn handle_confirm_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(id) = self.selected {
                    if self.db.delete(&id) {
                        self.set_status_message("Deleted task".to_string());
                    }
                    self.selected = None;
                    self.rebuild_rows();
                }
                self.state = AppState::List;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state = AppState::List;
                self.set_status_message("Deletion cancelled".to_string());
            }
            _ => {}
        }
        false
    }

    /// Render the task table and the details pane for the selected task.
    fn render_list(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(10)])
            .split(area);

        let header = Row::new(
            ["ID", "Title", "Status", "Priority", "Type"]
                .iter()
                .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))),
        )
        .height(1);

        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|row| {
                Row::new(vec![
                    Cell::from(row.display_id.to_string()),
                    Cell::from(row.indented_title()),
                    Cell::from(row.status.label()).style(status_style(row.status)),
                    Cell::from(row.priority.label())
                        .style(Style::default().fg(priority_color(row.priority))),
                    Cell::from(row.task_type.label()),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(5),
            Constraint::Min(25),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(6),
        ];

        let title = match self.filter {
            Some(ty) => format!("Tasks ({}) - {} only", self.rows.len(), ty.label()),
            None => format!("Tasks ({})", self.rows.len()),
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[0], &mut self.table_state);
        self.render_details(f, chunks[1]);
    }

    fn render_details(&self, f: &mut Frame, area: Rect) {
        let text = match self.selected.and_then(|id| self.db.get(&id)) {
            Some(task) => {
                let parent = task
                    .parent_id
                    .and_then(|p| self.db.get(&p))
                    .map(|p| format!("[{}] {}", p.display_id, p.title));
                vec![
                    Line::from(vec![
                        Span::styled("Title: ", Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(task.title.clone()),
                    ]),
                    Line::from(vec![
                        Span::styled("Status: ", Style::default().add_modifier(Modifier::BOLD)),
                        Span::styled(task.status.label(), status_style(task.status)),
                        Span::raw("   "),
                        Span::styled("Priority: ", Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(task.priority.label()),
                        Span::raw("   "),
                        Span::styled("Type: ", Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(task.task_type.label()),
                    ]),
                    Line::from(vec![
                        Span::styled("Parent: ", Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(parent.unwrap_or_else(|| "-".to_string())),
                    ]),
                    Line::from(vec![
                        Span::styled("Created: ", Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(task.created_at.format("%Y-%m-%d %H:%M").to_string()),
                        Span::raw("   "),
                        Span::styled("Updated: ", Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(task.updated_at.format("%Y-%m-%d %H:%M").to_string()),
                    ]),
                    Line::from(""),
                    Line::from(task.description.clone()),
                ]
            }
            None => vec![Line::from("No task selected")],
        };

        let details = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Details"))
            .wrap(Wrap { trim: false });
        f.render_widget(details, area);
    }

    fn render_form(&self, f: &mut Frame, area: Rect) {
        let title = if self.state == AppState::Add {
            "Add Task"
        } else {
            "Edit Task"
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(inner);

        self.render_text_field(f, chunks[0], "Title", &self.form.title.value, TITLE_FIELD);
        self.render_text_field(
            f,
            chunks[1],
            "Description",
            &self.form.description.value,
            DESCRIPTION_FIELD,
        );
        self.render_selector(
            f,
            chunks[2],
            "Status",
            self.form.selected_status().label(),
            STATUS_FIELD,
        );
        self.render_selector(
            f,
            chunks[3],
            "Priority",
            self.form.selected_priority().label(),
            PRIORITY_FIELD,
        );
        self.render_selector(
            f,
            chunks[4],
            "Type",
            self.form.selected_type().label(),
            TYPE_FIELD,
        );
        self.render_selector(
            f,
            chunks[5],
            "Parent",
            self.form.selected_parent_label(),
            PARENT_FIELD,
        );
    }

    fn field_style(&self, field: usize) -> Style {
        if self.form.current_field == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    }

    fn render_text_field(&self, f: &mut Frame, area: Rect, label: &str, value: &str, field: usize) {
        let widget = Paragraph::new(value.to_string()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(label.to_string())
                .border_style(self.field_style(field)),
        );
        f.render_widget(widget, area);
    }

    fn render_selector(&self, f: &mut Frame, area: Rect, label: &str, value: &str, field: usize) {
        let widget = Paragraph::new(format!("< {value} >")).block(
            Block::default()
                .borders(Borders::ALL)
                .title(label.to_string())
                .border_style(self.field_style(field)),
        );
        f.render_widget(widget, area);
    }

    fn render_confirm(&self, f: &mut Frame, area: Rect) {
        let title = self
            .selected
            .and_then(|id| self.db.get(&id))
            .map(|t| t.title.clone())
            .unwrap_or_default();

        let area = centered_rect(50, 20, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("Delete task '{title}'?"),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Its children are kept and become roots."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .title("Confirm Delete")
                    .borders(Borders::ALL)
                    .style(Style::default().bg(Color::Red).fg(Color::White)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else if self.db.is_degraded() {
            "Warning: task file could not be read; starting empty (see log)".to_string()
        } else {
            match self.state {
                AppState::List => {
                    "a add  e edit  d delete  s/S status  + priority  0-4 filter  r repair  q quit"
                        .to_string()
                }
                AppState::Add | AppState::Edit => {
                    "Tab next field  \u{2190}/\u{2192} choose  Enter save  Esc cancel".to_string()
                }
                AppState::ConfirmDelete => "Confirm deletion".to_string(),
            }
        };
        let style = if self.status_message.is_empty() && self.db.is_degraded() {
            Style::default().bg(Color::Red).fg(Color::White)
        } else {
            Style::default().bg(Color::DarkGray).fg(Color::White)
        };
        let status = Paragraph::new(status_text)
            .style(style)
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to the appropriate view renderers.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
            .split(f.area());

        match self.state {
            AppState::List => self.render_list(f, chunks[0]),
            AppState::Add | AppState::Edit => self.render_form(f, chunks[0]),
            AppState::ConfirmDelete => {
                self.render_list(f, chunks[0]);
                self.render_confirm(f, chunks[0]);
            }
        }
        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop: render and process input until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;
            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

/// A rectangle centered in `r`, sized as percentages of it.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Status;

    fn app_with_tasks() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(&dir.path().join("tasks.json"));
        app.form = TaskForm::new(&[]);
        app.form.title = crate::tui::input::InputField::with_value("first");
        app.submit_form();
        (dir, app)
    }

    #[test]
    fn submitting_the_add_form_creates_and_selects_the_task() {
        let (_dir, app) = app_with_tasks();
        assert_eq!(app.rows.len(), 1);
        assert_eq!(app.selected, Some(app.rows[0].key));
    }

    #[test]
    fn empty_title_is_rejected_by_the_form() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(&dir.path().join("tasks.json"));
        app.state = AppState::Add;
        app.submit_form();
        assert_eq!(app.status_message, "Title is required");
        assert!(app.rows.is_empty());
        assert_eq!(app.state, AppState::Add);
    }

    #[test]
    fn status_key_cycles_the_selected_task() {
        let (_dir, mut app) = app_with_tasks();
        app.handle_list_input(KeyCode::Char('s'));
        let id = app.selected.unwrap();
        assert_eq!(app.db.get(&id).unwrap().status, Status::InProgress);
    }

    #[test]
    fn filter_keys_narrow_and_reset_the_view() {
        let (_dir, mut app) = app_with_tasks();
        app.handle_list_input(KeyCode::Char('1'));
        assert!(app.rows.is_empty());
        app.handle_list_input(KeyCode::Char('0'));
        assert_eq!(app.rows.len(), 1);
    }
}
