//! Backend commands queued from UI to backend worker.

use std::path::PathBuf;

#[derive(Debug)]
pub enum BackendCommand {
    /// `None` when the picker was closed without a choice.
    SelectFile { path: Option<PathBuf> },
    Submit,
    Cancel,
    DismissFailure,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectFile { .. } => "select_file",
            Self::Submit => "submit",
            Self::Cancel => "cancel",
            Self::DismissFailure => "dismiss_failure",
        }
    }
}
