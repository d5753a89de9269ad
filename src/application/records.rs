//! Record service: anamnesis, examinations and predictions of one visit.

use std::sync::Arc;

use crate::domain::{
    Anamnesis, AnamnesisSaved, ExamResult, ExaminationDraft, ExaminationUploaded, Predictions,
};
use crate::ports::ClinicalApi;
use crate::ClinicError;

/// Service for the per-visit record tabs.
pub struct RecordService<A>
where
    A: ClinicalApi,
{
    api: Arc<A>,
}

impl<A> RecordService<A>
where
    A: ClinicalApi,
    A::Error: Into<ClinicError>,
{
    /// Create a new record service.
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Store the anamnesis of a visit.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub fn save_anamnesis(
        &self,
        visit_id: i64,
        anamnesis: &Anamnesis,
    ) -> Result<AnamnesisSaved, ClinicError> {
        let saved = self
            .api
            .upload_anamnesis(visit_id, anamnesis)
            .map_err(Into::into)?;
        tracing::info!(visit_id, anamnesis_id = saved.anamnesis_id, "Anamnesis saved");
        Ok(saved)
    }

    /// Previously saved anamnesis, if the server has one.
    ///
    /// Failures are logged and read as "nothing saved yet".
    pub fn load_anamnesis(&self, visit_id: i64) -> Option<Anamnesis> {
        match self.api.get_anamnesis(visit_id).map_err(Into::into) {
            Ok(anamnesis) => Some(anamnesis),
            Err(e) => {
                tracing::debug!(visit_id, "No anamnesis loaded: {}", e);
                None
            }
        }
    }

    /// Upload a diagnostic file for a visit.
    ///
    /// # Errors
    /// Returns `ClinicError::Validation` when the draft lacks a name or a
    /// readable file, otherwise any API error.
    pub fn upload_examination(
        &self,
        visit_id: i64,
        draft: &ExaminationDraft,
    ) -> Result<ExaminationUploaded, ClinicError> {
        let upload = draft.ready().map_err(ClinicError::Validation)?;
        if !upload.file.is_file() {
            return Err(ClinicError::Validation(format!(
                "File not found: {}",
                upload.file.display()
            )));
        }

        let uploaded = self
            .api
            .upload_examination(visit_id, &upload)
            .map_err(Into::into)?;
        tracing::info!(
            visit_id,
            examination_id = uploaded.visit_examination_id,
            "Examination uploaded"
        );
        Ok(uploaded)
    }

    /// Examinations already attached to a visit.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub fn list_examinations(&self, visit_id: i64) -> Result<Vec<ExamResult>, ClinicError> {
        self.api.list_examinations(visit_id).map_err(Into::into)
    }

    /// Request diagnostic suggestions for a visit.
    ///
    /// # Errors
    /// Returns error if the API call fails, typically because no anamnesis
    /// has been saved yet.
    pub fn predict(&self, visit_id: i64) -> Result<Predictions, ClinicError> {
        tracing::info!(visit_id, "Requesting prediction");
        let predictions = self.api.predict(visit_id).map_err(Into::into)?;
        tracing::info!(
            visit_id,
            suggestions = predictions.suggestions.len(),
            referrals = predictions.referrals.len(),
            "Prediction received"
        );
        Ok(predictions)
    }
}
