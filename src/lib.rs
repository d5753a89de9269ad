//! # clinicdesk
//!
//! Terminal front desk for a clinical records REST API.
//!
//! This crate provides:
//! - A typed blocking client for the `/v1/clinical` endpoints
//! - An in-memory mock of the same API for offline demos
//! - Terminal UI for patient/visit lists, anamnesis entry, examination upload
//!   and AI diagnostic suggestions
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Records mirrored from the API schema (Patient, Visit, Anamnesis, ...)
//! - `ports`: The `ClinicalApi` trait
//! - `adapters`: Concrete implementations (reqwest HTTP client, in-memory mock, log sanitizer)
//! - `application`: Multi-call flows built on the port
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use config::ClinicConfig;
pub use domain::{Anamnesis, Patient, Predictions, Visit};

/// Result type for clinicdesk operations
pub type Result<T> = std::result::Result<T, ClinicError>;

/// Main error type for clinicdesk
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error(transparent)]
    Api(#[from] adapters::ApiError),

    #[error(transparent)]
    Mock(#[from] adapters::MockError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
