//! Bridge between the UI thread and the backend worker that drives the
//! submission controller.

pub mod commands;
pub mod runtime;
