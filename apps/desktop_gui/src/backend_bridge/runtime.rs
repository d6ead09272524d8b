//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::SubmissionController;
use crossbeam_channel::{Receiver, Sender};
use shared::domain::SelectedFile;
use tokio::sync::broadcast::error::RecvError;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiEvent};

pub fn launch(
    controller: Arc<SubmissionController>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::startup(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                ))));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let mut events = controller.subscribe_events();
            let ui_tx_events = ui_tx.clone();
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => {
                            let _ = ui_tx_events.try_send(UiEvent::from_controller_event(event));
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "backend: controller event forwarder lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
            let _ = ui_tx.try_send(UiEvent::Info("Choose a PDF to extract".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                tracing::debug!(command = cmd.name(), "backend: command received");
                match cmd {
                    BackendCommand::SelectFile { path } => {
                        controller
                            .select_file(path.as_deref().map(SelectedFile::from_path))
                            .await;
                    }
                    BackendCommand::Submit => {
                        let controller = Arc::clone(&controller);
                        tokio::spawn(async move {
                            if let Err(err) = controller.submit().await {
                                tracing::info!("backend: submit rejected: {err}");
                            }
                        });
                    }
                    BackendCommand::Cancel => {
                        controller.cancel().await;
                    }
                    BackendCommand::DismissFailure => {
                        controller.dismiss_failure().await;
                    }
                }
            }
            tracing::info!("backend: command queue closed, worker exiting");
        });
    });
}
