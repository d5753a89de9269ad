//! TUI module: Terminal User Interface using Ratatui.
//!
//! Screens for the clinic front desk:
//! - Patient and visit lists
//! - New patient registration
//! - Per-visit anamnesis, examinations and AI diagnostics

mod app;
mod styles;
mod ui;
mod worker;

pub use app::{App, View};
pub use styles::{ClinicTheme, APP_NAME};
pub use worker::{
    ApiOutcome, ApiRequest, ApiWorker, ApiWorkerHandle, ClinicServices, RequestKind,
    WorkerPoll,
};
