//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the application and the remote clinical API.

mod clinical_api;

pub use clinical_api::ClinicalApi;
