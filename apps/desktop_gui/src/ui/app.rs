use std::{path::PathBuf, time::Duration};

use client_core::{render::results_view, SubmissionSnapshot};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use tokio::sync::watch;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiEvent},
    orchestration::dispatch_backend_command,
};

const PICKER_PROMPT: &str = "Click to choose a PDF";
const SUBMIT_LABEL: &str = "Extract Details";
const SUBMITTING_LABEL: &str = "Processing…";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitButtonView {
    pub label: &'static str,
    pub enabled: bool,
    pub busy: bool,
}

pub fn submit_button_view(snapshot: &SubmissionSnapshot) -> SubmitButtonView {
    let busy = snapshot.is_submitting();
    SubmitButtonView {
        label: if busy { SUBMITTING_LABEL } else { SUBMIT_LABEL },
        enabled: snapshot.can_submit(),
        busy,
    }
}

pub fn picker_caption(snapshot: &SubmissionSnapshot) -> &str {
    snapshot
        .selected_file
        .as_ref()
        .map(|file| file.display_name())
        .unwrap_or(PICKER_PROMPT)
}

fn default_picker_dir() -> Option<PathBuf> {
    dirs::desktop_dir()
        .or_else(dirs::download_dir)
        .or_else(dirs::document_dir)
        .or_else(dirs::home_dir)
}

pub struct ExtractorApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    snapshots: watch::Receiver<SubmissionSnapshot>,
    endpoint: String,
    status: String,
    notice: Option<String>,
    last_error: Option<UiError>,
}

impl ExtractorApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        snapshots: watch::Receiver<SubmissionSnapshot>,
        endpoint: String,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            snapshots,
            endpoint,
            status: "Backend worker starting...".to_string(),
            notice: None,
            last_error: None,
        }
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Notice(message) => {
                    self.notice = Some(message);
                }
                UiEvent::Error(err) => {
                    tracing::warn!(category = ?err.category(), "ui: {}", err.message());
                    self.status = err.headline().to_string();
                    self.last_error = Some(err);
                }
            }
        }
    }

    fn show_picker(&mut self, ui: &mut egui::Ui, snapshot: &SubmissionSnapshot) {
        ui.label(egui::RichText::new("Choose PDF File").strong());
        ui.horizontal(|ui| {
            let enabled = !snapshot.is_submitting();
            if ui
                .add_enabled(enabled, egui::Button::new("📄 Browse…"))
                .clicked()
            {
                let mut dialog = rfd::FileDialog::new().add_filter("PDF", &["pdf"]);
                if let Some(dir) = default_picker_dir() {
                    dialog = dialog.set_directory(dir);
                }
                let path = dialog.pick_file();
                self.dispatch(BackendCommand::SelectFile { path });
            }
            ui.label(picker_caption(snapshot));
        });
        if snapshot.selected_file.is_some() {
            ui.label(egui::RichText::new("PDF selected ✓").small());
        }
    }

    fn show_submit(&mut self, ui: &mut egui::Ui, snapshot: &SubmissionSnapshot) {
        let view = submit_button_view(snapshot);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(view.enabled, egui::Button::new(view.label))
                .clicked()
            {
                self.last_error = None;
                self.dispatch(BackendCommand::Submit);
            }
            if view.busy {
                ui.spinner();
                if ui.button("Cancel").clicked() {
                    self.dispatch(BackendCommand::Cancel);
                }
            }
        });
    }

    fn show_failure(&mut self, ui: &mut egui::Ui, snapshot: &SubmissionSnapshot) {
        let Some(failure) = snapshot.failure() else {
            return;
        };
        let headline = self
            .last_error
            .as_ref()
            .map(UiError::headline)
            .unwrap_or("Extraction failed.");
        let retryable = self.last_error.as_ref().is_some_and(UiError::is_retryable);
        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .show(ui, |ui| {
                ui.colored_label(ui.visuals().error_fg_color, headline);
                ui.label(failure.to_string());
                ui.horizontal(|ui| {
                    if retryable && ui.button("Retry").clicked() {
                        self.last_error = None;
                        self.dispatch(BackendCommand::Submit);
                    }
                    if ui.button("Dismiss").clicked() {
                        self.last_error = None;
                        self.dispatch(BackendCommand::DismissFailure);
                    }
                });
            });
    }

    fn show_results(&self, ui: &mut egui::Ui, snapshot: &SubmissionSnapshot) {
        let view = results_view(snapshot);
        if !view.is_shown() {
            return;
        }
        let text = view.lines().join("\n");
        ui.separator();
        ui.heading("✔ Extracted Data");
        egui::Frame::group(ui.style()).show(ui, |ui| {
            egui::ScrollArea::vertical()
                .max_height(ui.available_height())
                .show(ui, |ui| {
                    ui.monospace(text);
                });
        });
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let Some(message) = self.notice.clone() else {
            return;
        };
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.notice = None;
                }
            });
    }
}

impl eframe::App for ExtractorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        let snapshot = self.snapshots.borrow_and_update().clone();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&self.status).weak());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(egui::RichText::new(&self.endpoint).weak());
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("PDF User Details");
                ui.label("Extract and view user information from PDF files");
            });
            ui.add_space(12.0);
            self.show_picker(ui, &snapshot);
            ui.add_space(8.0);
            self.show_submit(ui, &snapshot);
            ui.add_space(8.0);
            self.show_failure(ui, &snapshot);
            self.show_results(ui, &snapshot);
        });

        self.show_notice(ctx);

        if snapshot.is_submitting() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::SubmissionStatus;
    use shared::domain::{ResultSet, SelectedFile};

    fn with_file(status: SubmissionStatus) -> SubmissionSnapshot {
        SubmissionSnapshot {
            selected_file: Some(SelectedFile::new(
                "/tmp/sample.pdf",
                "sample.pdf",
                "application/pdf",
            )),
            status,
            submission_id: None,
        }
    }

    #[test]
    fn submit_is_disabled_without_a_file() {
        let view = submit_button_view(&SubmissionSnapshot::default());
        assert!(!view.enabled);
        assert_eq!(view.label, SUBMIT_LABEL);
        assert_eq!(picker_caption(&SubmissionSnapshot::default()), PICKER_PROMPT);
    }

    #[test]
    fn submit_is_disabled_and_busy_while_submitting() {
        let view = submit_button_view(&with_file(SubmissionStatus::Submitting));
        assert!(!view.enabled);
        assert!(view.busy);
        assert_eq!(view.label, SUBMITTING_LABEL);
    }

    #[test]
    fn submit_is_enabled_after_completion() {
        let snapshot = with_file(SubmissionStatus::Completed(ResultSet::new()));
        let view = submit_button_view(&snapshot);
        assert!(view.enabled);
        assert!(!view.busy);
        assert_eq!(picker_caption(&snapshot), "sample.pdf");
    }
}
