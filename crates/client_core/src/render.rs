//! Text rendering of extraction results.
//!
//! One line per field, `<name> : <value>`, in the order the service returned
//! them. Underscores in field names are shown as spaces; the result set itself
//! is never rewritten.

use serde_json::Value;
use shared::domain::{field_value_text, ResultSet};

use crate::SubmissionSnapshot;

pub const FIELD_NAME_SEPARATOR: char = '_';
pub const FIELD_DELIMITER: &str = " : ";

pub fn display_field_name(name: &str) -> String {
    name.replace(FIELD_NAME_SEPARATOR, " ")
}

pub fn render_field(name: &str, value: &Value) -> String {
    format!(
        "{}{FIELD_DELIMITER}{}",
        display_field_name(name),
        field_value_text(value)
    )
}

pub fn render_lines(result: &ResultSet) -> Vec<String> {
    result
        .iter()
        .map(|(name, value)| render_field(name, value))
        .collect()
}

/// Newline-terminated lines, as shown in the results panel.
pub fn render_text(result: &ResultSet) -> String {
    render_lines(result)
        .into_iter()
        .map(|line| line + "\n")
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsView {
    /// No result to show; the results region is not drawn at all.
    Hidden,
    /// Results region is drawn, possibly with zero lines.
    Shown(Vec<String>),
}

impl ResultsView {
    pub fn is_shown(&self) -> bool {
        matches!(self, Self::Shown(_))
    }

    pub fn lines(&self) -> &[String] {
        match self {
            Self::Hidden => &[],
            Self::Shown(lines) => lines,
        }
    }
}

pub fn results_view(snapshot: &SubmissionSnapshot) -> ResultsView {
    match snapshot.result() {
        Some(result) => ResultsView::Shown(render_lines(result)),
        None => ResultsView::Hidden,
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
