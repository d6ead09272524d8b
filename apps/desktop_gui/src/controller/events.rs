//! UI/backend events and error modeling for desktop GUI controller.

use client_core::ControllerEvent;
use shared::error::ExtractionError;

#[derive(Debug)]
pub enum UiEvent {
    Info(String),
    /// Alert-style message that needs acknowledging, e.g. "Upload a PDF".
    Notice(String),
    Error(UiError),
}

impl UiEvent {
    pub fn from_controller_event(event: ControllerEvent) -> Self {
        match event {
            ControllerEvent::FileSelected(Some(file)) => {
                UiEvent::Info(format!("Selected {}", file.display_name()))
            }
            ControllerEvent::FileSelected(None) => UiEvent::Info("No file selected".to_string()),
            ControllerEvent::SubmissionStarted { file, .. } => {
                UiEvent::Info(format!("Processing {}…", file.display_name()))
            }
            ControllerEvent::SubmissionCompleted { field_count, .. } => {
                let plural = if field_count == 1 { "" } else { "s" };
                UiEvent::Info(format!("Extracted {field_count} field{plural}"))
            }
            ControllerEvent::SubmissionFailed { error, .. } => UiEvent::Error(
                UiError::from_extraction_error(UiErrorContext::Submit, &error),
            ),
            ControllerEvent::SubmissionCancelled { .. } => {
                UiEvent::Info("Submission cancelled".to_string())
            }
            ControllerEvent::Notice(message) => UiEvent::Notice(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Service,
    Parse,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Submit,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
    retryable: bool,
}

impl UiError {
    pub fn from_extraction_error(context: UiErrorContext, error: &ExtractionError) -> Self {
        let category = match error {
            ExtractionError::Transport(_) | ExtractionError::TimedOut(_) => {
                UiErrorCategory::Transport
            }
            ExtractionError::Service { .. } => UiErrorCategory::Service,
            ExtractionError::Parse(_) => UiErrorCategory::Parse,
            ExtractionError::ReadFile { .. } => UiErrorCategory::Validation,
        };
        Self {
            category,
            context,
            message: error.to_string(),
            retryable: error.is_transient(),
        }
    }

    /// The backend worker could not start; no submission can run.
    pub fn startup(message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Unknown,
            context: UiErrorContext::BackendStartup,
            message: message.into(),
            retryable: false,
        }
    }

    /// One-line guidance shown above the raw message.
    pub fn headline(&self) -> &'static str {
        match (self.context, self.category) {
            (UiErrorContext::BackendStartup, _) => {
                "Backend worker failed to start; restart the app."
            }
            (_, UiErrorCategory::Transport) => {
                "Extraction service unreachable; check the server URL and retry."
            }
            (_, UiErrorCategory::Service) => "The extraction service rejected the document.",
            (_, UiErrorCategory::Parse) => "The extraction service sent an unreadable response.",
            (_, UiErrorCategory::Validation) => "The selected file could not be used.",
            (_, UiErrorCategory::Unknown) => "Extraction failed.",
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::SelectedFile;
    use std::time::Duration;

    #[test]
    fn classifies_extraction_errors_by_variant() {
        let timed_out = UiError::from_extraction_error(
            UiErrorContext::Submit,
            &ExtractionError::TimedOut(Duration::from_secs(120)),
        );
        assert_eq!(timed_out.category(), UiErrorCategory::Transport);
        assert!(timed_out.is_retryable());

        let rejected = UiError::from_extraction_error(
            UiErrorContext::Submit,
            &ExtractionError::Service {
                status: 400,
                message: "No file uploaded".to_string(),
            },
        );
        assert_eq!(rejected.category(), UiErrorCategory::Service);
        assert!(rejected.message().contains("No file uploaded"));
        assert!(!rejected.is_retryable());

        let unavailable = UiError::from_extraction_error(
            UiErrorContext::Submit,
            &ExtractionError::Service {
                status: 503,
                message: "busy".to_string(),
            },
        );
        assert!(unavailable.is_retryable());

        let parse = UiError::from_extraction_error(
            UiErrorContext::Submit,
            &ExtractionError::parse("expected a JSON object of fields, got an array"),
        );
        assert_eq!(parse.category(), UiErrorCategory::Parse);
        assert!(!parse.is_retryable());
    }

    #[test]
    fn startup_errors_are_not_retryable() {
        let err =
            UiError::startup("backend worker startup failure: failed to build runtime: os error");
        assert_eq!(err.category(), UiErrorCategory::Unknown);
        assert!(!err.is_retryable());
        assert_eq!(
            err.headline(),
            "Backend worker failed to start; restart the app."
        );
    }

    #[test]
    fn maps_controller_events_to_ui_events() {
        let file = SelectedFile::new("/tmp/sample.pdf", "sample.pdf", "application/pdf");
        match UiEvent::from_controller_event(ControllerEvent::FileSelected(Some(file))) {
            UiEvent::Info(text) => assert_eq!(text, "Selected sample.pdf"),
            other => panic!("unexpected event: {other:?}"),
        }
        match UiEvent::from_controller_event(ControllerEvent::Notice("Upload a PDF".to_string()))
        {
            UiEvent::Notice(text) => assert_eq!(text, "Upload a PDF"),
            other => panic!("unexpected event: {other:?}"),
        }
        match UiEvent::from_controller_event(ControllerEvent::SubmissionCompleted {
            submission_id: 1,
            field_count: 1,
        }) {
            UiEvent::Info(text) => assert_eq!(text, "Extracted 1 field"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(
            UiEvent::from_controller_event(ControllerEvent::SubmissionFailed {
                submission_id: 2,
                error: ExtractionError::transport("connection refused"),
            }),
            UiEvent::Error(_)
        ));
    }
}
