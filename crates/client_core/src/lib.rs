use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{
    domain::{ResultSet, SelectedFile},
    error::ExtractionError,
    protocol::{decode_extract_response, EXTRACT_ROUTE, FILE_PART_NAME},
};
use thiserror::Error;
use tokio::sync::{broadcast, watch, Mutex, Notify};
use tracing::{debug, info, warn};
use url::Url;

pub mod config;
pub mod render;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn extract(&self, file: &SelectedFile) -> std::result::Result<ResultSet, ExtractionError>;
}

/// Stand-in used when no usable server URL is configured; every submission
/// fails with a transport error instead of the front end refusing to start.
pub struct UnconfiguredExtractionService {
    reason: String,
}

impl UnconfiguredExtractionService {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ExtractionService for UnconfiguredExtractionService {
    async fn extract(&self, _file: &SelectedFile) -> std::result::Result<ResultSet, ExtractionError> {
        Err(ExtractionError::transport(format!(
            "extraction service is not configured: {}",
            self.reason
        )))
    }
}

pub struct HttpExtractionService {
    http: Client,
    endpoint: Url,
}

impl HttpExtractionService {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            endpoint: extract_endpoint(server_url)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// `<server_url>/extract`, keeping any path prefix of the server URL.
pub fn extract_endpoint(server_url: &str) -> Result<Url> {
    let mut base = Url::parse(server_url.trim())
        .with_context(|| format!("invalid extraction server url '{server_url}'"))?;
    if base.cannot_be_a_base() {
        bail!("extraction server url '{server_url}' cannot carry a path");
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(EXTRACT_ROUTE)
        .with_context(|| format!("failed to build extract endpoint from '{server_url}'"))
}

#[async_trait]
impl ExtractionService for HttpExtractionService {
    async fn extract(&self, file: &SelectedFile) -> std::result::Result<ResultSet, ExtractionError> {
        let bytes = tokio::fs::read(file.path())
            .await
            .map_err(|err| ExtractionError::ReadFile {
                path: file.path().to_path_buf(),
                message: err.to_string(),
            })?;
        let size_bytes = bytes.len();

        let part = Part::bytes(bytes)
            .file_name(file.display_name().to_string())
            .mime_str(file.mime_type())
            .map_err(|err| {
                ExtractionError::transport(format!(
                    "invalid MIME type '{}': {err}",
                    file.mime_type()
                ))
            })?;
        let form = Form::new().part(FILE_PART_NAME, part);

        debug!(
            endpoint = %self.endpoint,
            file = file.display_name(),
            size_bytes,
            "posting file to extraction service"
        );
        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|err| ExtractionError::transport(err.to_string()))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|err| {
            ExtractionError::transport(format!("failed to read response body: {err}"))
        })?;
        debug!(status = status.as_u16(), body_bytes = body.len(), "extraction response received");
        decode_extract_response(status.as_u16(), &body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionStatus {
    Idle,
    Submitting,
    Completed(ResultSet),
    Failed(ExtractionError),
}

/// Point-in-time copy of the controller state handed to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionSnapshot {
    pub selected_file: Option<SelectedFile>,
    pub status: SubmissionStatus,
    /// Id of the most recent submission, if any was started.
    pub submission_id: Option<u64>,
}

impl Default for SubmissionSnapshot {
    fn default() -> Self {
        Self {
            selected_file: None,
            status: SubmissionStatus::Idle,
            submission_id: None,
        }
    }
}

impl SubmissionSnapshot {
    pub fn result(&self) -> Option<&ResultSet> {
        match &self.status {
            SubmissionStatus::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ExtractionError> {
        match &self.status {
            SubmissionStatus::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.status == SubmissionStatus::Submitting
    }

    /// Whether a submit action should be offered to the user.
    pub fn can_submit(&self) -> bool {
        self.selected_file.is_some() && !self.is_submitting()
    }
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    FileSelected(Option<SelectedFile>),
    SubmissionStarted {
        submission_id: u64,
        file: SelectedFile,
    },
    SubmissionCompleted {
        submission_id: u64,
        field_count: usize,
    },
    SubmissionFailed {
        submission_id: u64,
        error: ExtractionError,
    },
    SubmissionCancelled {
        submission_id: u64,
    },
    /// User-facing notice that did not change any state.
    Notice(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Upload a PDF")]
    NoFileSelected,
    #[error("a submission is already in progress")]
    AlreadySubmitting,
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// `None` waits for the service indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

struct ActiveSubmission {
    submission_id: u64,
    cancel: Arc<Notify>,
}

/// Held by `submit` while its request is outstanding; releases the
/// submission if the future is dropped early.
struct PendingSubmission {
    controller: Arc<SubmissionController>,
    submission_id: u64,
    settled: bool,
}

impl Drop for PendingSubmission {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let submission_id = self.submission_id;
        debug!(submission_id, "submit future dropped before completion");
        if let Ok(mut state) = self.controller.inner.try_lock() {
            self.controller.abandon_locked(&mut state, Some(submission_id));
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let controller = Arc::clone(&self.controller);
                handle.spawn(async move {
                    let mut state = controller.inner.lock().await;
                    controller.abandon_locked(&mut state, Some(submission_id));
                });
            }
            Err(_) => warn!(
                submission_id,
                "submit dropped outside a runtime; call cancel() to release it"
            ),
        }
    }
}

struct ControllerState {
    selected_file: Option<SelectedFile>,
    status: SubmissionStatus,
    submission_id: Option<u64>,
    next_submission_id: u64,
    active: Option<ActiveSubmission>,
}

/// Owns the selected file and the submission lifecycle. At most one
/// submission is outstanding; a response is applied only while its
/// submission is still the active one.
pub struct SubmissionController {
    service: Arc<dyn ExtractionService>,
    request_timeout: Option<Duration>,
    inner: Mutex<ControllerState>,
    snapshots: watch::Sender<SubmissionSnapshot>,
    events: broadcast::Sender<ControllerEvent>,
}

impl SubmissionController {
    pub fn new(service: Arc<dyn ExtractionService>) -> Arc<Self> {
        Self::new_with_options(service, ControllerOptions::default())
    }

    pub fn new_with_options(
        service: Arc<dyn ExtractionService>,
        options: ControllerOptions,
    ) -> Arc<Self> {
        let (snapshots, _) = watch::channel(SubmissionSnapshot::default());
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            service,
            request_timeout: options.request_timeout,
            inner: Mutex::new(ControllerState {
                selected_file: None,
                status: SubmissionStatus::Idle,
                submission_id: None,
                next_submission_id: 0,
                active: None,
            }),
            snapshots,
            events,
        })
    }

    pub fn observe(&self) -> watch::Receiver<SubmissionSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SubmissionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Replaces the selected file, or clears it with `None`. The current
    /// status and any displayed result are left alone.
    pub async fn select_file(&self, file: Option<SelectedFile>) {
        let mut state = self.inner.lock().await;
        match &file {
            Some(file) => info!(
                file = file.display_name(),
                mime_type = file.mime_type(),
                "file selected"
            ),
            None => info!("file selection cleared"),
        }
        state.selected_file = file.clone();
        self.publish(&state);
        let _ = self.events.send(ControllerEvent::FileSelected(file));
    }

    /// Sends the selected file to the extraction service and records the
    /// outcome in the controller state. Only rejections are returned here;
    /// service failures end up as `SubmissionStatus::Failed`.
    ///
    /// Dropping the returned future before it finishes abandons the
    /// submission the same way `cancel` does.
    pub async fn submit(self: &Arc<Self>) -> std::result::Result<(), SubmitError> {
        let (file, submission_id, cancel) = self.begin_submission().await?;
        let mut pending = PendingSubmission {
            controller: Arc::clone(self),
            submission_id,
            settled: false,
        };

        let outcome = tokio::select! {
            outcome = self.request(&file) => Some(outcome),
            _ = cancel.notified() => None,
        };

        match outcome {
            Some(outcome) => self.finish_submission(submission_id, outcome).await,
            None => debug!(submission_id, "submission abandoned before the service answered"),
        }
        pending.settled = true;
        Ok(())
    }

    /// Abandons the outstanding submission, if any. Returns whether one was
    /// cancelled.
    pub async fn cancel(&self) -> bool {
        let mut state = self.inner.lock().await;
        self.abandon_locked(&mut state, None)
    }

    /// Clears a failure indicator. Returns whether there was one.
    pub async fn dismiss_failure(&self) -> bool {
        let mut state = self.inner.lock().await;
        if !matches!(state.status, SubmissionStatus::Failed(_)) {
            return false;
        }
        state.status = SubmissionStatus::Idle;
        self.publish(&state);
        true
    }

    /// Drops the active submission and returns to `Idle`. With `only` set,
    /// nothing happens unless that submission is still the active one.
    fn abandon_locked(&self, state: &mut ControllerState, only: Option<u64>) -> bool {
        let is_target = state
            .active
            .as_ref()
            .is_some_and(|active| only.map_or(true, |id| active.submission_id == id));
        if !is_target {
            return false;
        }
        let Some(active) = state.active.take() else {
            return false;
        };
        active.cancel.notify_one();
        state.status = SubmissionStatus::Idle;
        self.publish(state);
        info!(submission_id = active.submission_id, "submission cancelled");
        let _ = self.events.send(ControllerEvent::SubmissionCancelled {
            submission_id: active.submission_id,
        });
        true
    }

    async fn begin_submission(
        &self,
    ) -> std::result::Result<(SelectedFile, u64, Arc<Notify>), SubmitError> {
        let mut state = self.inner.lock().await;
        let Some(file) = state.selected_file.clone() else {
            warn!("submit requested without a selected file");
            let _ = self
                .events
                .send(ControllerEvent::Notice(SubmitError::NoFileSelected.to_string()));
            return Err(SubmitError::NoFileSelected);
        };
        if state.active.is_some() {
            warn!(
                submission_id = ?state.submission_id,
                "submit rejected: a submission is already in progress"
            );
            return Err(SubmitError::AlreadySubmitting);
        }

        state.next_submission_id += 1;
        let submission_id = state.next_submission_id;
        let cancel = Arc::new(Notify::new());
        state.active = Some(ActiveSubmission {
            submission_id,
            cancel: Arc::clone(&cancel),
        });
        state.status = SubmissionStatus::Submitting;
        state.submission_id = Some(submission_id);
        self.publish(&state);

        info!(
            submission_id,
            file = file.display_name(),
            "submission started"
        );
        let _ = self.events.send(ControllerEvent::SubmissionStarted {
            submission_id,
            file: file.clone(),
        });
        Ok((file, submission_id, cancel))
    }

    async fn request(
        &self,
        file: &SelectedFile,
    ) -> std::result::Result<ResultSet, ExtractionError> {
        let extraction = self.service.extract(file);
        match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, extraction)
                .await
                .unwrap_or_else(|_| Err(ExtractionError::TimedOut(limit))),
            None => extraction.await,
        }
    }

    async fn finish_submission(
        &self,
        submission_id: u64,
        outcome: std::result::Result<ResultSet, ExtractionError>,
    ) {
        let mut state = self.inner.lock().await;
        let is_active = state
            .active
            .as_ref()
            .is_some_and(|active| active.submission_id == submission_id);
        if !is_active {
            debug!(submission_id, "discarding stale extraction response");
            return;
        }
        state.active = None;

        let event = match outcome {
            Ok(result) => {
                let field_count = result.len();
                info!(submission_id, field_count, "submission completed");
                state.status = SubmissionStatus::Completed(result);
                ControllerEvent::SubmissionCompleted {
                    submission_id,
                    field_count,
                }
            }
            Err(error) => {
                warn!(submission_id, %error, "submission failed");
                state.status = SubmissionStatus::Failed(error.clone());
                ControllerEvent::SubmissionFailed {
                    submission_id,
                    error,
                }
            }
        };
        self.publish(&state);
        let _ = self.events.send(event);
    }

    fn publish(&self, state: &ControllerState) {
        self.snapshots.send_replace(SubmissionSnapshot {
            selected_file: state.selected_file.clone(),
            status: state.status.clone(),
            submission_id: state.submission_id,
        });
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
