//! Application layer: Use cases and services.
//!
//! This module strings single `ClinicalApi` calls together into the flows
//! the screens need, and converts adapter errors into `ClinicError`.

mod records;
mod visits;

pub use records::RecordService;
pub use visits::{unique_patient_ids, OpenedPatient, VisitBoard, VisitRow, VisitService};
