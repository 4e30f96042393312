//! Color and style constants for the terminal user interface.

use ratatui::style::{Color, Modifier, Style};

use crate::fields::{Priority, Status};

/// Style a status the way the list renders it.
pub fn status_style(status: Status) -> Style {
    match status {
        Status::ToDo => Style::default().add_modifier(Modifier::DIM),
        Status::InProgress => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        Status::Done => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        Status::Blocked => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD),
    }
}

/// Accent color for a priority level.
pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::DarkGray,
        Priority::Medium => Color::White,
        Priority::High => Color::Yellow,
        Priority::Critical => Color::Red,
    }
}
