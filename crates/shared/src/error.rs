use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Why a submission ended without a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("failed to read {}: {message}", path.display())]
    ReadFile { path: PathBuf, message: String },
    #[error("extraction service unreachable: {0}")]
    Transport(String),
    #[error("extraction service returned {status}: {message}")]
    Service { status: u16, message: String },
    #[error("malformed extraction response: {0}")]
    Parse(String),
    #[error("extraction service did not answer within {}s", .0.as_secs())]
    TimedOut(Duration),
}

impl ExtractionError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Transport-level failures may succeed on retry without user action.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::TimedOut(_) => true,
            Self::Service { status, .. } => *status >= 500,
            Self::ReadFile { .. } | Self::Parse(_) => false,
        }
    }
}
