//! UI layer for desktop GUI: the single-page extraction form.

pub mod app;

pub use app::ExtractorApp;
