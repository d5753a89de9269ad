//! Runtime selection between the HTTP client and the in-memory mock.

use crate::adapters::{HttpClinicalApi, MockClinicalApi};
use crate::config::ClinicConfig;
use crate::domain::{
    Anamnesis, AnamnesisSaved, ExamResult, ExaminationUpload, ExaminationUploaded, Patient,
    PatientCreate, Predictions, Visit, VisitCreate, VisitCreated, VisitQuery,
};
use crate::ports::ClinicalApi;
use crate::ClinicError;

/// The API the application talks to, chosen by `CLINICDESK_USE_MOCK`.
pub enum ClinicalBackend {
    Http(HttpClinicalApi),
    Mock(MockClinicalApi),
}

impl ClinicalBackend {
    /// Build the backend described by `config`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be constructed.
    pub fn from_config(config: &ClinicConfig) -> Result<Self, ClinicError> {
        if config.use_mock {
            tracing::info!("Using in-memory mock API");
            let mut mock = MockClinicalApi::new();
            if let Some(latency) = config.mock_latency {
                mock = mock.with_latency(latency);
            }
            return Ok(Self::Mock(mock));
        }

        tracing::info!(base = %config.api_base, "Using clinical API");
        Ok(Self::Http(HttpClinicalApi::new(
            &config.api_base,
            config.http_timeout,
        )?))
    }

    /// Short description for the status line.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Http(api) => api.base_url().to_string(),
            Self::Mock(_) => "mock data".to_string(),
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $api:ident => $call:expr) => {
        match $self {
            Self::Http($api) => $call.map_err(ClinicError::from),
            Self::Mock($api) => $call.map_err(ClinicError::from),
        }
    };
}

impl ClinicalApi for ClinicalBackend {
    type Error = ClinicError;

    fn create_patient(&self, patient: &PatientCreate) -> Result<Patient, Self::Error> {
        dispatch!(self, api => api.create_patient(patient))
    }

    fn get_patient(&self, patient_id: i64) -> Result<Patient, Self::Error> {
        dispatch!(self, api => api.get_patient(patient_id))
    }

    fn create_visit(&self, visit: &VisitCreate) -> Result<VisitCreated, Self::Error> {
        dispatch!(self, api => api.create_visit(visit))
    }

    fn list_visits(&self, query: &VisitQuery) -> Result<Vec<Visit>, Self::Error> {
        dispatch!(self, api => api.list_visits(query))
    }

    fn get_visit(&self, visit_id: i64) -> Result<Visit, Self::Error> {
        dispatch!(self, api => api.get_visit(visit_id))
    }

    fn upload_anamnesis(
        &self,
        visit_id: i64,
        anamnesis: &Anamnesis,
    ) -> Result<AnamnesisSaved, Self::Error> {
        dispatch!(self, api => api.upload_anamnesis(visit_id, anamnesis))
    }

    fn get_anamnesis(&self, visit_id: i64) -> Result<Anamnesis, Self::Error> {
        dispatch!(self, api => api.get_anamnesis(visit_id))
    }

    fn upload_examination(
        &self,
        visit_id: i64,
        upload: &ExaminationUpload,
    ) -> Result<ExaminationUploaded, Self::Error> {
        dispatch!(self, api => api.upload_examination(visit_id, upload))
    }

    fn list_examinations(&self, visit_id: i64) -> Result<Vec<ExamResult>, Self::Error> {
        dispatch!(self, api => api.list_examinations(visit_id))
    }

    fn predict(&self, visit_id: i64) -> Result<Predictions, Self::Error> {
        dispatch!(self, api => api.predict(visit_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_mock_selected_by_flag() {
        let config = ClinicConfig {
            use_mock: true,
            mock_latency: Some(Duration::ZERO),
            ..ClinicConfig::default()
        };
        let backend = ClinicalBackend::from_config(&config).expect("Should build");
        assert_eq!(backend.describe(), "mock data");
        let patient = backend.get_patient(2).expect("Seeded patient");
        assert_eq!(patient.id, 2);
    }

    #[test]
    fn test_http_by_default() {
        let backend =
            ClinicalBackend::from_config(&ClinicConfig::default()).expect("Should build");
        assert!(matches!(backend, ClinicalBackend::Http(_)));
    }

    #[test]
    fn test_mock_errors_convert() {
        let config = ClinicConfig {
            use_mock: true,
            mock_latency: Some(Duration::ZERO),
            ..ClinicConfig::default()
        };
        let backend = ClinicalBackend::from_config(&config).expect("Should build");
        let err = backend.get_visit(404).unwrap_err();
        assert!(matches!(err, ClinicError::Mock(_)));
    }
}
