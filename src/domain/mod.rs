//! Domain layer: records mirrored from the clinical API schema.
//!
//! Pure data types with serde mappings and the small amount of client-side
//! logic the screens need (age labels, form merging, upload readiness).

mod anamnesis;
mod examination;
mod patient;
mod prediction;
mod visit;

pub use anamnesis::{
    Anamnesis, AnamnesisList, AnamnesisSaved, General, Genetic, Lifestyle, Merge, Smoking,
};
pub use examination::{
    format_size_mb, ExamResult, ExaminationDraft, ExaminationUpload, ExaminationUploaded,
    FileKind,
};
pub use patient::{format_api_date, sex_label, Patient, PatientCreate, Sex};
pub use prediction::{DiagnosisSuggestion, Predictions, ProbabilityBand, ReferralSuggestion};
pub use visit::{Visit, VisitCreate, VisitCreated, VisitQuery, VisitStatus};
