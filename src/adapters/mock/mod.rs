//! In-memory adapter: `ClinicalApi` without a server.
//!
//! Seeded with a handful of patients, visits and results so every screen has
//! something to show. Each call sleeps for a configurable latency to mimic the
//! remote service; tests construct it with zero latency.

mod seed;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::{
    Anamnesis, AnamnesisSaved, DiagnosisSuggestion, ExamResult, ExaminationUpload,
    ExaminationUploaded, Patient, PatientCreate, Predictions, ReferralSuggestion, Visit,
    VisitCreate, VisitCreated, VisitQuery,
};
use crate::ports::ClinicalApi;

/// Page size used when a visit query carries no limit.
const DEFAULT_LIST_LIMIT: usize = 50;

/// Error type for mock operations.
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Anamnesis not found. Fill in the anamnesis before requesting a prediction.")]
    MissingAnamnesis,

    #[error("Invalid result data: {0}")]
    InvalidResultData(#[from] serde_json::Error),

    #[error("Cannot read upload file: {0}")]
    File(#[from] std::io::Error),

    #[error("Mock state lock poisoned")]
    Poisoned,
}

/// Simulated response times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockLatency {
    pub default: Duration,
    pub upload: Duration,
    pub predict: Duration,
}

impl Default for MockLatency {
    fn default() -> Self {
        Self {
            default: Duration::from_millis(500),
            upload: Duration::from_millis(1000),
            predict: Duration::from_millis(2000),
        }
    }
}

impl MockLatency {
    /// Same latency for every call.
    #[must_use]
    pub fn uniform(latency: Duration) -> Self {
        Self {
            default: latency,
            upload: latency,
            predict: latency,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    patients: Vec<Patient>,
    visits: Vec<Visit>,
    anamnesis: HashMap<i64, Anamnesis>,
    examinations: HashMap<i64, Vec<ExamResult>>,
    predictions: HashMap<i64, Predictions>,
}

/// In-memory clinical API.
pub struct MockClinicalApi {
    state: Mutex<MockState>,
    latency: MockLatency,
}

impl Default for MockClinicalApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClinicalApi {
    /// Seeded mock with the default latencies.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(seed::state()),
            latency: MockLatency::default(),
        }
    }

    /// Mock with no records at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            latency: MockLatency::default(),
        }
    }

    /// Override the latency of every call.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = MockLatency::uniform(latency);
        self
    }

    fn state(&self) -> Result<MutexGuard<'_, MockState>, MockError> {
        self.state.lock().map_err(|_| MockError::Poisoned)
    }

    fn respond<T>(&self, delay: Duration, value: T) -> Result<T, MockError> {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        Ok(value)
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn sort_key(created_at: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(created_at)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Prediction derived from the anamnesis when no canned one exists.
fn rule_based_prediction(anamnesis: &Anamnesis) -> Predictions {
    let mut suggestions = Vec::new();
    let mut referrals = Vec::new();

    if anamnesis.smokes() {
        suggestions.push(DiagnosisSuggestion {
            disease_name: "Chronic obstructive pulmonary disease".to_string(),
            probability: 0.6,
            rationale: Some("COPD risk is raised by smoking".to_string()),
        });
        referrals.push(ReferralSuggestion {
            specialty: "Pulmonologist".to_string(),
            note: Some("Lung function assessment".to_string()),
        });
    }

    let headache = anamnesis
        .complaints
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|c| c.to_lowercase().contains("headache"));
    if headache {
        suggestions.push(DiagnosisSuggestion {
            disease_name: "Tension-type headache".to_string(),
            probability: 0.7,
            rationale: Some("Complaints of headache".to_string()),
        });
        referrals.push(ReferralSuggestion {
            specialty: "Neurologist".to_string(),
            note: Some("Differential diagnosis of headache".to_string()),
        });
    }

    if anamnesis.has_family_history() {
        suggestions.push(DiagnosisSuggestion {
            disease_name: "Hereditary predisposition".to_string(),
            probability: 0.5,
            rationale: Some("Family history of disease needs attention".to_string()),
        });
    }

    if suggestions.is_empty() {
        suggestions.push(DiagnosisSuggestion {
            disease_name: "Additional examination required".to_string(),
            probability: 0.3,
            rationale: Some("Not enough data for an accurate prediction".to_string()),
        });
        referrals.push(ReferralSuggestion {
            specialty: "General practitioner".to_string(),
            note: Some("General assessment of the patient's condition".to_string()),
        });
    }

    Predictions {
        suggestions,
        referrals,
    }
}

impl ClinicalApi for MockClinicalApi {
    type Error = MockError;

    fn create_patient(&self, patient: &PatientCreate) -> Result<Patient, Self::Error> {
        let created = {
            let mut state = self.state()?;
            let id = state.patients.iter().map(|p| p.id).max().unwrap_or(0) + 1;
            let created = Patient {
                id,
                date_of_birth: patient.date_of_birth,
                recorded_age: patient.recorded_age,
                sex: patient.sex,
                created_at: now_rfc3339(),
            };
            state.patients.push(created.clone());
            created
        };
        tracing::debug!(patient_id = created.id, "Mock: patient created");
        self.respond(self.latency.default, created)
    }

    fn get_patient(&self, patient_id: i64) -> Result<Patient, Self::Error> {
        let patient = self
            .state()?
            .patients
            .iter()
            .find(|p| p.id == patient_id)
            .cloned()
            .ok_or_else(|| MockError::NotFound(format!("Patient {patient_id}")))?;
        self.respond(self.latency.default, patient)
    }

    fn create_visit(&self, visit: &VisitCreate) -> Result<VisitCreated, Self::Error> {
        let visit_id = {
            let mut state = self.state()?;
            let id = state.visits.iter().map(|v| v.id).max().unwrap_or(0) + 1;
            state.visits.push(Visit {
                id,
                patient_id: visit.patient_id,
                doctor_id: visit.doctor_id.clone(),
                status: "pending".to_string(),
                created_at: now_rfc3339(),
            });
            id
        };
        self.respond(self.latency.default, VisitCreated { visit_id })
    }

    fn list_visits(&self, query: &VisitQuery) -> Result<Vec<Visit>, Self::Error> {
        let mut visits: Vec<Visit> = {
            let state = self.state()?;
            state
                .visits
                .iter()
                .filter(|v| query.patient_id.map_or(true, |pid| v.patient_id == pid))
                .cloned()
                .collect()
        };

        visits.sort_by(|a, b| {
            sort_key(&b.created_at)
                .cmp(&sort_key(&a.created_at))
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let offset = query.offset.unwrap_or(0) as usize;
        let limit = match query.limit {
            Some(l) if l > 0 => l as usize,
            _ => DEFAULT_LIST_LIMIT,
        };
        let page = visits.into_iter().skip(offset).take(limit).collect();
        self.respond(self.latency.default, page)
    }

    fn get_visit(&self, visit_id: i64) -> Result<Visit, Self::Error> {
        let visit = self
            .state()?
            .visits
            .iter()
            .find(|v| v.id == visit_id)
            .cloned()
            .ok_or_else(|| MockError::NotFound(format!("Visit {visit_id}")))?;
        self.respond(self.latency.default, visit)
    }

    fn upload_anamnesis(
        &self,
        visit_id: i64,
        anamnesis: &Anamnesis,
    ) -> Result<AnamnesisSaved, Self::Error> {
        self.state()?.anamnesis.insert(visit_id, anamnesis.clone());
        self.respond(
            self.latency.default,
            AnamnesisSaved {
                anamnesis_id: visit_id,
            },
        )
    }

    fn get_anamnesis(&self, visit_id: i64) -> Result<Anamnesis, Self::Error> {
        let anamnesis = self
            .state()?
            .anamnesis
            .get(&visit_id)
            .cloned()
            .ok_or_else(|| MockError::NotFound(format!("Anamnesis for visit {visit_id}")))?;
        self.respond(self.latency.default, anamnesis)
    }

    fn upload_examination(
        &self,
        visit_id: i64,
        upload: &ExaminationUpload,
    ) -> Result<ExaminationUploaded, Self::Error> {
        let size = std::fs::metadata(&upload.file)?.len();
        let file_name = upload.file_name();
        let result_data = match &upload.result_data {
            Some(raw) => serde_json::from_str::<serde_json::Value>(raw)?,
            None => serde_json::json!({ "filename": file_name.as_str(), "size": size }),
        };

        let uploaded = {
            let mut state = self.state()?;
            let id = state
                .examinations
                .values()
                .flatten()
                .map(|e| e.id)
                .max()
                .unwrap_or(0)
                + 1;
            let s3_path = format!("/mock/{file_name}_{id}");
            state
                .examinations
                .entry(visit_id)
                .or_default()
                .push(ExamResult {
                    id,
                    examination_name: upload.examination_name.clone(),
                    s3_path: s3_path.clone(),
                    result_text: upload.result_text.clone(),
                    result_data,
                    created_at: now_rfc3339(),
                });
            ExaminationUploaded {
                s3_path,
                visit_examination_id: id,
            }
        };
        self.respond(self.latency.upload, uploaded)
    }

    fn list_examinations(&self, visit_id: i64) -> Result<Vec<ExamResult>, Self::Error> {
        let exams = self
            .state()?
            .examinations
            .get(&visit_id)
            .cloned()
            .unwrap_or_default();
        self.respond(self.latency.default, exams)
    }

    fn predict(&self, visit_id: i64) -> Result<Predictions, Self::Error> {
        let prediction = {
            let state = self.state()?;
            let anamnesis = state
                .anamnesis
                .get(&visit_id)
                .ok_or(MockError::MissingAnamnesis)?;
            state
                .predictions
                .get(&visit_id)
                .cloned()
                .unwrap_or_else(|| rule_based_prediction(anamnesis))
        };
        self.respond(self.latency.predict, prediction)
    }
}
