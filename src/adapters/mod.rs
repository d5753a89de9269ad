//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external systems:
//! - `backend`: runtime choice between the two APIs
//! - `http`: reqwest client for the clinical REST API
//! - `mock`: in-memory stand-in with simulated latency
//! - `sanitize`: PII filtering for logs

pub mod backend;
pub mod http;
pub mod mock;
pub mod sanitize;

pub use backend::ClinicalBackend;
pub use http::{ApiError, HttpClinicalApi};
pub use mock::{MockClinicalApi, MockError, MockLatency};
