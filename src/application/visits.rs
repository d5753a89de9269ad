//! Visit service: patient registration and the visit board.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::domain::{Patient, PatientCreate, Visit, VisitCreate, VisitQuery};
use crate::ports::ClinicalApi;
use crate::ClinicError;

/// A patient opened in the details screen.
///
/// `visit_id` is `None` when no visit could be found or created; the screen
/// then shows a notice instead of the record tabs.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedPatient {
    pub patient: Patient,
    pub visit_id: Option<i64>,
}

/// One visit joined with its patient.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitRow {
    pub visit: Visit,
    pub patient: Patient,
}

/// Recent visits with their patients resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitBoard {
    pub rows: Vec<VisitRow>,
    /// Patients that could not be fetched; their visits are not in `rows`.
    pub missing_patients: Vec<i64>,
}

impl VisitBoard {
    /// Distinct patients in the order their first visit appears.
    #[must_use]
    pub fn patients(&self) -> Vec<Patient> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|row| seen.insert(row.patient.id))
            .map(|row| row.patient.clone())
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Distinct patient ids of `visits`, first occurrence wins.
#[must_use]
pub fn unique_patient_ids(visits: &[Visit]) -> Vec<i64> {
    let mut seen = HashSet::new();
    visits
        .iter()
        .map(|v| v.patient_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Service for the patient and visit screens.
pub struct VisitService<A>
where
    A: ClinicalApi,
{
    api: Arc<A>,
    doctor_id: Option<String>,
}

impl<A> VisitService<A>
where
    A: ClinicalApi,
    A::Error: Into<ClinicError>,
{
    /// Create a new visit service.
    pub fn new(api: Arc<A>, doctor_id: Option<String>) -> Self {
        Self { api, doctor_id }
    }

    fn new_visit(&self, patient_id: i64) -> Result<i64, ClinicError> {
        let created = self
            .api
            .create_visit(&VisitCreate {
                patient_id,
                doctor_id: self.doctor_id.clone(),
            })
            .map_err(Into::into)?;
        tracing::info!(patient_id, visit_id = created.visit_id, "Visit created");
        Ok(created.visit_id)
    }

    /// Register a patient and open a visit for them.
    ///
    /// # Errors
    /// Returns error only if the patient cannot be created. A failed visit
    /// creation still opens the patient, without a visit.
    pub fn register_patient(&self, create: &PatientCreate) -> Result<OpenedPatient, ClinicError> {
        let patient = self.api.create_patient(create).map_err(Into::into)?;
        tracing::info!(patient_id = patient.id, "Patient registered");

        let visit_id = match self.new_visit(patient.id) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(patient_id = patient.id, "Failed to create visit: {}", e);
                None
            }
        };
        Ok(OpenedPatient { patient, visit_id })
    }

    /// Open a patient on their latest visit, creating one when none exists.
    ///
    /// Never fails: lookup errors open the patient without a visit.
    pub fn open_patient(&self, patient: Patient) -> OpenedPatient {
        let latest = self
            .api
            .list_visits(&VisitQuery::for_patient(patient.id, 1))
            .map_err(Into::into);

        let visit_id = match latest {
            Ok(visits) => match visits.first() {
                Some(visit) => Some(visit.id),
                None => match self.new_visit(patient.id) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        tracing::warn!(patient_id = patient.id, "Failed to create visit: {}", e);
                        None
                    }
                },
            },
            Err(e) => {
                tracing::warn!(patient_id = patient.id, "Failed to look up visits: {}", e);
                None
            }
        };
        OpenedPatient { patient, visit_id }
    }

    /// Open a patient on a known visit.
    #[must_use]
    pub fn open_visit(&self, patient: Patient, visit_id: i64) -> OpenedPatient {
        OpenedPatient {
            patient,
            visit_id: Some(visit_id),
        }
    }

    /// List visits and resolve each distinct patient once.
    ///
    /// # Errors
    /// Returns error if the visit list cannot be fetched. Individual patient
    /// failures only drop that patient's rows.
    pub fn load_visit_board(&self, query: &VisitQuery) -> Result<VisitBoard, ClinicError> {
        let visits = self.api.list_visits(query).map_err(Into::into)?;
        let ids = unique_patient_ids(&visits);
        tracing::debug!(
            visits = visits.len(),
            patients = ids.len(),
            "Resolving visit board"
        );

        let mut patients = HashMap::with_capacity(ids.len());
        let mut missing_patients = Vec::new();
        for id in ids {
            match self.api.get_patient(id).map_err(Into::into) {
                Ok(patient) => {
                    patients.insert(id, patient);
                }
                Err(e) => {
                    tracing::warn!(patient_id = id, "Failed to load patient: {}", e);
                    missing_patients.push(id);
                }
            }
        }

        let rows = visits
            .into_iter()
            .filter_map(|visit| {
                let patient = patients.get(&visit.patient_id)?.clone();
                Some(VisitRow { visit, patient })
            })
            .collect();

        Ok(VisitBoard {
            rows,
            missing_patients,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::adapters::{MockClinicalApi, MockError};
    use crate::domain::{
        Anamnesis, AnamnesisSaved, ExamResult, ExaminationUpload, ExaminationUploaded,
        Predictions, Sex, VisitCreated,
    };

    /// Mock that counts patient fetches and can be told to fail some calls.
    struct CountingApi {
        inner: MockClinicalApi,
        patient_fetches: AtomicUsize,
        broken_patient: Option<i64>,
        fail_visits: bool,
    }

    impl CountingApi {
        fn new() -> Self {
            Self {
                inner: MockClinicalApi::new().with_latency(Duration::ZERO),
                patient_fetches: AtomicUsize::new(0),
                broken_patient: None,
                fail_visits: false,
            }
        }
    }

    impl ClinicalApi for CountingApi {
        type Error = MockError;

        fn create_patient(&self, p: &PatientCreate) -> Result<Patient, MockError> {
            self.inner.create_patient(p)
        }
        fn get_patient(&self, id: i64) -> Result<Patient, MockError> {
            self.patient_fetches.fetch_add(1, Ordering::SeqCst);
            if self.broken_patient == Some(id) {
                return Err(MockError::NotFound(format!("Patient {id}")));
            }
            self.inner.get_patient(id)
        }
        fn create_visit(&self, v: &VisitCreate) -> Result<VisitCreated, MockError> {
            if self.fail_visits {
                return Err(MockError::Poisoned);
            }
            self.inner.create_visit(v)
        }
        fn list_visits(&self, q: &VisitQuery) -> Result<Vec<Visit>, MockError> {
            self.inner.list_visits(q)
        }
        fn get_visit(&self, id: i64) -> Result<Visit, MockError> {
            self.inner.get_visit(id)
        }
        fn upload_anamnesis(&self, id: i64, a: &Anamnesis) -> Result<AnamnesisSaved, MockError> {
            self.inner.upload_anamnesis(id, a)
        }
        fn get_anamnesis(&self, id: i64) -> Result<Anamnesis, MockError> {
            self.inner.get_anamnesis(id)
        }
        fn upload_examination(
            &self,
            id: i64,
            u: &ExaminationUpload,
        ) -> Result<ExaminationUploaded, MockError> {
            self.inner.upload_examination(id, u)
        }
        fn list_examinations(&self, id: i64) -> Result<Vec<ExamResult>, MockError> {
            self.inner.list_examinations(id)
        }
        fn predict(&self, id: i64) -> Result<Predictions, MockError> {
            self.inner.predict(id)
        }
    }

    fn service(api: CountingApi) -> (Arc<CountingApi>, VisitService<CountingApi>) {
        let api = Arc::new(api);
        let service = VisitService::new(Arc::clone(&api), Some("dr_test".to_string()));
        (api, service)
    }

    #[test]
    fn test_unique_patient_ids_keeps_first_seen_order() {
        let visit = |id, patient_id| Visit {
            id,
            patient_id,
            doctor_id: None,
            status: "pending".to_string(),
            created_at: String::new(),
        };
        let visits = vec![visit(1, 3), visit(2, 1), visit(3, 3), visit(4, 2), visit(5, 1)];
        assert_eq!(unique_patient_ids(&visits), vec![3, 1, 2]);
    }

    #[test]
    fn test_board_fetches_each_patient_once() {
        let (api, service) = service(CountingApi::new());
        let board = service
            .load_visit_board(&VisitQuery::recent(50))
            .expect("Should load");

        // Five seeded visits over four patients
        assert_eq!(board.rows.len(), 5);
        assert_eq!(api.patient_fetches.load(Ordering::SeqCst), 4);
        assert_eq!(board.rows[0].visit.id, 5);
        assert_eq!(board.rows[0].patient.id, 1);

        let patients: Vec<i64> = board.patients().iter().map(|p| p.id).collect();
        assert_eq!(patients, vec![1, 4, 3, 2]);
    }

    #[test]
    fn test_board_skips_unavailable_patient() {
        let mut api = CountingApi::new();
        api.broken_patient = Some(1);
        let (_, service) = service(api);
        let board = service
            .load_visit_board(&VisitQuery::recent(50))
            .expect("Should load");
        assert_eq!(board.rows.len(), 3);
        assert_eq!(board.missing_patients, vec![1]);
        assert!(board.rows.iter().all(|r| r.patient.id != 1));
    }

    #[test]
    fn test_register_creates_visit() {
        let (api, service) = service(CountingApi::new());
        let opened = service
            .register_patient(&PatientCreate {
                date_of_birth: None,
                recorded_age: Some(40),
                sex: Some(Sex::Female),
            })
            .expect("Should register");
        assert_eq!(opened.patient.id, 5);
        assert_eq!(opened.visit_id, Some(6));

        let visit = api.get_visit(6).expect("Visit exists");
        assert_eq!(visit.doctor_id.as_deref(), Some("dr_test"));
    }

    #[test]
    fn test_register_survives_visit_failure() {
        let mut api = CountingApi::new();
        api.fail_visits = true;
        let (_, service) = service(api);
        let opened = service
            .register_patient(&PatientCreate::default())
            .expect("Patient is still created");
        assert_eq!(opened.visit_id, None);
    }

    #[test]
    fn test_open_patient_uses_latest_visit() {
        let (api, service) = service(CountingApi::new());
        let patient = api.get_patient(1).expect("Seeded");
        let opened = service.open_patient(patient);
        assert_eq!(opened.visit_id, Some(5));
    }

    #[test]
    fn test_open_patient_creates_missing_visit() {
        let (api, service) = service(CountingApi::new());
        let patient = api
            .create_patient(&PatientCreate::default())
            .expect("Should create");
        let opened = service.open_patient(patient);
        assert_eq!(opened.visit_id, Some(6));
    }

    #[test]
    fn test_open_patient_without_visit_on_failure() {
        let mut api = CountingApi::new();
        api.fail_visits = true;
        let (api, service) = service(api);
        let patient = api
            .create_patient(&PatientCreate::default())
            .expect("Should create");
        assert_eq!(service.open_patient(patient).visit_id, None);
    }
}
