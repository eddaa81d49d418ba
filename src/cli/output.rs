//! Terminal and JSON output for CLI commands

use crate::core::{Priority, Status};
use crate::error::Result;
use colored::{ColoredString, Colorize};
use serde::Serialize;

/// Prints command results either as colored text or as JSON
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    json: bool,
}

impl OutputFormatter {
    /// Create a formatter; `no_color` disables ANSI colors process-wide
    pub fn new(json: bool, no_color: bool) -> Self {
        if no_color || json {
            colored::control::set_override(false);
        }
        Self { json }
    }

    pub const fn is_json(&self) -> bool {
        self.json
    }

    pub fn success(&self, message: &str) {
        if !self.json {
            println!("{} {message}", "✓".green().bold());
        }
    }

    pub fn info(&self, message: &str) {
        if !self.json {
            println!("{message}");
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.json {
            eprintln!("{} {message}", "warning:".yellow().bold());
        }
    }

    /// Errors go to stderr in every mode
    pub fn error(&self, message: &str) {
        eprintln!("{} {message}", "error:".red().bold());
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

pub fn paint_status(status: Status) -> ColoredString {
    let label = status.as_str();
    match status {
        Status::Open => label.cyan(),
        Status::InProgress => label.blue(),
        Status::PendingCustomer => label.yellow(),
        Status::Resolved => label.green(),
        Status::Closed => label.dimmed(),
    }
}

pub fn paint_priority(priority: Priority) -> ColoredString {
    let label = priority.as_str();
    match priority {
        Priority::Low => label.normal(),
        Priority::Medium => label.yellow(),
        Priority::High => label.red(),
        Priority::Urgent => label.red().bold(),
    }
}
