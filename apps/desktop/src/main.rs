use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use anyhow::Result;
use clap::Parser;
use client_core::{
    config::{load_settings, Settings},
    render::render_text,
    HttpExtractionService, SubmissionController, SubmissionStatus,
};
use shared::domain::{SelectedFile, PDF_MIME_TYPE};
use tracing::{info, warn};

/// Submit a PDF to the extraction service and print the extracted fields.
#[derive(Parser, Debug)]
struct Args {
    /// PDF file to submit.
    pdf: Option<PathBuf>,
    /// Base URL of the extraction service; `/extract` is appended.
    #[arg(long)]
    server_url: Option<String>,
    /// Request timeout in seconds, `0` to wait indefinitely.
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Print the result as JSON instead of `name : value` lines.
    #[arg(long)]
    json: bool,
}

fn apply_overrides(mut settings: Settings, args: &Args) -> Settings {
    if let Some(url) = &args.server_url {
        settings.server_url = url.clone();
    }
    if let Some(secs) = args.timeout_secs {
        settings.request_timeout_secs = secs;
    }
    settings
}

/// The upload is always declared as a PDF; other extensions are sent anyway
/// and left for the service to reject.
fn selection_for(path: &Path) -> SelectedFile {
    let file = SelectedFile::from_path(path);
    if file.is_pdf() {
        return file;
    }
    warn!(
        file = file.display_name(),
        guessed = file.mime_type(),
        "file does not look like a PDF; sending it as {PDF_MIME_TYPE}"
    );
    SelectedFile::new(file.path(), file.display_name(), PDF_MIME_TYPE)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let settings = apply_overrides(load_settings(), &args);

    let service = HttpExtractionService::new(&settings.server_url)?;
    info!(endpoint = %service.endpoint(), "using extraction service");
    let controller =
        SubmissionController::new_with_options(Arc::new(service), settings.controller_options());

    controller
        .select_file(args.pdf.as_deref().map(selection_for))
        .await;

    let submitted = tokio::select! {
        submitted = controller.submit() => submitted,
        _ = tokio::signal::ctrl_c() => {
            controller.cancel().await;
            eprintln!("Cancelled");
            return Ok(ExitCode::from(130));
        }
    };
    if let Err(err) = submitted {
        eprintln!("{err}");
        return Ok(ExitCode::FAILURE);
    }

    match controller.snapshot().status {
        SubmissionStatus::Completed(result) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render_text(&result));
            }
            Ok(ExitCode::SUCCESS)
        }
        SubmissionStatus::Failed(error) => {
            eprintln!("Extraction failed: {error}");
            Ok(ExitCode::FAILURE)
        }
        other => {
            eprintln!("Submission ended without a result ({other:?})");
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_loaded_settings() {
        let args = Args::parse_from([
            "desktop",
            "--server-url",
            "http://127.0.0.1:9000",
            "--timeout-secs",
            "0",
            "sample.pdf",
        ]);
        let settings = apply_overrides(Settings::default(), &args);
        assert_eq!(settings.server_url, "http://127.0.0.1:9000");
        assert_eq!(settings.request_timeout(), None);
        assert_eq!(args.pdf, Some(PathBuf::from("sample.pdf")));
    }

    #[test]
    fn selections_are_always_declared_as_pdf() {
        let pdf = selection_for(Path::new("/tmp/sample.pdf"));
        assert_eq!(pdf.mime_type(), PDF_MIME_TYPE);
        assert_eq!(pdf.display_name(), "sample.pdf");

        let notes = selection_for(Path::new("/tmp/notes.txt"));
        assert_eq!(notes.mime_type(), PDF_MIME_TYPE);
        assert_eq!(notes.display_name(), "notes.txt");
        assert_eq!(notes.path(), Path::new("/tmp/notes.txt"));
    }

    #[test]
    fn missing_pdf_is_accepted_by_the_parser() {
        let args = Args::parse_from(["desktop", "--json"]);
        assert!(args.pdf.is_none());
        assert!(args.json);
        assert_eq!(apply_overrides(Settings::default(), &args), Settings::default());
    }
}
