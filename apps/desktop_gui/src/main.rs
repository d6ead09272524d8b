use std::sync::Arc;

mod backend_bridge;
mod controller;
mod ui;

use client_core::{
    config::load_settings, ExtractionService, HttpExtractionService, SubmissionController,
    UnconfiguredExtractionService,
};
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::ExtractorApp;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let (service, endpoint): (Arc<dyn ExtractionService>, String) =
        match HttpExtractionService::new(&settings.server_url) {
            Ok(service) => {
                let endpoint = service.endpoint().to_string();
                let service: Arc<dyn ExtractionService> = Arc::new(service);
                (service, endpoint)
            }
            Err(err) => {
                tracing::error!("unusable extraction server url: {err:#}");
                let service: Arc<dyn ExtractionService> =
                    Arc::new(UnconfiguredExtractionService::new(format!("{err:#}")));
                (service, format!("{} (invalid)", settings.server_url))
            }
        };
    let controller = SubmissionController::new_with_options(service, settings.controller_options());
    let snapshots = controller.observe();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(controller, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("PDF User Details")
            .with_inner_size([720.0, 640.0])
            .with_min_inner_size([480.0, 420.0]),
        ..Default::default()
    };
    eframe::run_native(
        "PDF User Details",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(ExtractorApp::new(cmd_tx, ui_rx, snapshots, endpoint)))
        }),
    )
}
