//! Clinical API port: one method per REST endpoint.
//!
//! This trait abstracts the remote backend from the application logic so the
//! HTTP client and the in-memory mock are interchangeable.

use crate::domain::{
    Anamnesis, AnamnesisSaved, ExamResult, ExaminationUpload, ExaminationUploaded, Patient,
    PatientCreate, Predictions, Visit, VisitCreate, VisitCreated, VisitQuery,
};

/// Operations offered by the clinical records API.
///
/// Implementations are shared with the background worker, hence `Send + Sync`.
pub trait ClinicalApi: Send + Sync {
    /// Error type for API operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// `POST /v1/clinical/patients`
    ///
    /// # Errors
    /// Returns error if the request fails or the server rejects it.
    fn create_patient(&self, patient: &PatientCreate) -> Result<Patient, Self::Error>;

    /// `GET /v1/clinical/patients/{id}`
    ///
    /// # Errors
    /// Returns error if the request fails or the patient does not exist.
    fn get_patient(&self, patient_id: i64) -> Result<Patient, Self::Error>;

    /// `POST /v1/clinical/visits`
    ///
    /// # Errors
    /// Returns error if the request fails or the server rejects it.
    fn create_visit(&self, visit: &VisitCreate) -> Result<VisitCreated, Self::Error>;

    /// `GET /v1/clinical/visits?limit&offset&patient_id`
    ///
    /// # Errors
    /// Returns error if the request fails.
    fn list_visits(&self, query: &VisitQuery) -> Result<Vec<Visit>, Self::Error>;

    /// `GET /v1/clinical/visits/{id}`
    ///
    /// # Errors
    /// Returns error if the request fails or the visit does not exist.
    fn get_visit(&self, visit_id: i64) -> Result<Visit, Self::Error>;

    /// `POST /v1/clinical/visits/{id}/anamnesis`
    ///
    /// # Errors
    /// Returns error if the request fails or the server rejects it.
    fn upload_anamnesis(
        &self,
        visit_id: i64,
        anamnesis: &Anamnesis,
    ) -> Result<AnamnesisSaved, Self::Error>;

    /// `GET /v1/clinical/visits/{id}/anamnesis`
    ///
    /// # Errors
    /// Returns error if the request fails or no anamnesis was recorded.
    fn get_anamnesis(&self, visit_id: i64) -> Result<Anamnesis, Self::Error>;

    /// `POST /v1/clinical/visits/{id}/examinations` (multipart)
    ///
    /// # Errors
    /// Returns error if the file cannot be read or the request fails.
    fn upload_examination(
        &self,
        visit_id: i64,
        upload: &ExaminationUpload,
    ) -> Result<ExaminationUploaded, Self::Error>;

    /// `GET /v1/clinical/visits/{id}/examinations`
    ///
    /// # Errors
    /// Returns error if the request fails.
    fn list_examinations(&self, visit_id: i64) -> Result<Vec<ExamResult>, Self::Error>;

    /// `POST /v1/clinical/visits/{id}/predict`
    ///
    /// # Errors
    /// Returns error if the request fails, typically when no anamnesis exists.
    fn predict(&self, visit_id: i64) -> Result<Predictions, Self::Error>;
}
