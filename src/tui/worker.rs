//! Background API worker for non-blocking network calls.
//!
//! Each flow runs on its own thread and reports a single [`ApiOutcome`] over
//! a channel, so the TUI main loop keeps drawing while the API responds.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::application::{OpenedPatient, RecordService, VisitBoard, VisitService};
use crate::domain::{
    Anamnesis, ExamResult, ExaminationDraft, ExaminationUploaded, Patient, PatientCreate,
    Predictions, VisitQuery,
};
use crate::ports::ClinicalApi;
use crate::ClinicError;

/// Services shared by all worker threads.
pub struct ClinicServices<A>
where
    A: ClinicalApi,
{
    pub visits: VisitService<A>,
    pub records: RecordService<A>,
}

impl<A> ClinicServices<A>
where
    A: ClinicalApi,
    A::Error: Into<ClinicError>,
{
    pub fn new(api: Arc<A>, doctor_id: Option<String>) -> Self {
        Self {
            visits: VisitService::new(Arc::clone(&api), doctor_id),
            records: RecordService::new(api),
        }
    }
}

/// A flow to run in the background.
#[derive(Debug, Clone)]
pub enum ApiRequest {
    LoadBoard(VisitQuery),
    RegisterPatient(PatientCreate),
    OpenPatient(Patient),
    LoadAnamnesis(i64),
    SaveAnamnesis { visit_id: i64, anamnesis: Anamnesis },
    LoadExaminations(i64),
    UploadExamination { visit_id: i64, draft: ExaminationDraft },
    Predict(i64),
}

/// Which flow a request starts, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    LoadBoard,
    RegisterPatient,
    OpenPatient,
    LoadAnamnesis,
    SaveAnamnesis,
    LoadExaminations,
    UploadExamination,
    Predict,
}

impl ApiRequest {
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::LoadBoard(_) => RequestKind::LoadBoard,
            Self::RegisterPatient(_) => RequestKind::RegisterPatient,
            Self::OpenPatient(_) => RequestKind::OpenPatient,
            Self::LoadAnamnesis(_) => RequestKind::LoadAnamnesis,
            Self::SaveAnamnesis { .. } => RequestKind::SaveAnamnesis,
            Self::LoadExaminations(_) => RequestKind::LoadExaminations,
            Self::UploadExamination { .. } => RequestKind::UploadExamination,
            Self::Predict(_) => RequestKind::Predict,
        }
    }
}

/// Result of an [`ApiRequest`]. Errors are already rendered to text.
#[derive(Debug, Clone)]
pub enum ApiOutcome {
    Board(Result<VisitBoard, String>),
    Registered(Result<OpenedPatient, String>),
    Opened(OpenedPatient),
    AnamnesisLoaded {
        visit_id: i64,
        anamnesis: Option<Anamnesis>,
    },
    AnamnesisSaved {
        visit_id: i64,
        result: Result<(), String>,
    },
    ExaminationsLoaded {
        visit_id: i64,
        result: Result<Vec<ExamResult>, String>,
    },
    ExaminationUploaded {
        visit_id: i64,
        result: Result<ExaminationUploaded, String>,
    },
    Predicted {
        visit_id: i64,
        result: Result<Predictions, String>,
    },
}

/// Handle to a running worker.
pub struct ApiWorkerHandle {
    kind: RequestKind,
    outcome_rx: Receiver<ApiOutcome>,
    _handle: JoinHandle<()>,
}

/// What polling a worker produced.
#[derive(Debug)]
pub enum WorkerPoll {
    Pending,
    Done(ApiOutcome),
    /// The thread ended without reporting (it panicked).
    Lost,
}

impl ApiWorkerHandle {
    /// The flow this worker runs.
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Check for the outcome without blocking.
    #[must_use]
    pub fn poll(&self) -> WorkerPoll {
        match self.outcome_rx.try_recv() {
            Ok(outcome) => WorkerPoll::Done(outcome),
            Err(TryRecvError::Empty) => WorkerPoll::Pending,
            Err(TryRecvError::Disconnected) => WorkerPoll::Lost,
        }
    }
}

/// Spawns one thread per API flow.
pub struct ApiWorker;

impl ApiWorker {
    /// Spawn a background flow.
    ///
    /// Returns a handle to receive its outcome.
    pub fn spawn<A>(services: Arc<ClinicServices<A>>, request: ApiRequest) -> ApiWorkerHandle
    where
        A: ClinicalApi + 'static,
        A::Error: Into<ClinicError>,
    {
        let kind = request.kind();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::run(&services, request, &tx);
        });

        ApiWorkerHandle {
            kind,
            outcome_rx: rx,
            _handle: handle,
        }
    }

    fn run<A>(services: &ClinicServices<A>, request: ApiRequest, tx: &Sender<ApiOutcome>)
    where
        A: ClinicalApi,
        A::Error: Into<ClinicError>,
    {
        let text = |e: ClinicError| e.to_string();

        let outcome = match request {
            ApiRequest::LoadBoard(query) => {
                ApiOutcome::Board(services.visits.load_visit_board(&query).map_err(text))
            }
            ApiRequest::RegisterPatient(create) => {
                ApiOutcome::Registered(services.visits.register_patient(&create).map_err(text))
            }
            ApiRequest::OpenPatient(patient) => {
                ApiOutcome::Opened(services.visits.open_patient(patient))
            }
            ApiRequest::LoadAnamnesis(visit_id) => ApiOutcome::AnamnesisLoaded {
                visit_id,
                anamnesis: services.records.load_anamnesis(visit_id),
            },
            ApiRequest::SaveAnamnesis {
                visit_id,
                anamnesis,
            } => ApiOutcome::AnamnesisSaved {
                visit_id,
                result: services
                    .records
                    .save_anamnesis(visit_id, &anamnesis)
                    .map(|_| ())
                    .map_err(text),
            },
            ApiRequest::LoadExaminations(visit_id) => ApiOutcome::ExaminationsLoaded {
                visit_id,
                result: services.records.list_examinations(visit_id).map_err(text),
            },
            ApiRequest::UploadExamination { visit_id, draft } => {
                ApiOutcome::ExaminationUploaded {
                    visit_id,
                    result: services
                        .records
                        .upload_examination(visit_id, &draft)
                        .map_err(text),
                }
            }
            ApiRequest::Predict(visit_id) => ApiOutcome::Predicted {
                visit_id,
                result: services.records.predict(visit_id).map_err(text),
            },
        };

        // The UI may have quit already
        let _ = tx.send(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use crate::adapters::MockClinicalApi;

    fn services() -> Arc<ClinicServices<MockClinicalApi>> {
        let api = Arc::new(MockClinicalApi::new().with_latency(Duration::ZERO));
        Arc::new(ClinicServices::new(api, None))
    }

    fn wait(handle: &ApiWorkerHandle) -> ApiOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match handle.poll() {
                WorkerPoll::Done(outcome) => return outcome,
                WorkerPoll::Lost => panic!("Worker died"),
                WorkerPoll::Pending if Instant::now() > deadline => panic!("Worker timed out"),
                WorkerPoll::Pending => thread::sleep(Duration::from_millis(5)),
            }
        }
    }

    #[test]
    fn test_board_outcome() {
        let handle = ApiWorker::spawn(services(), ApiRequest::LoadBoard(VisitQuery::recent(50)));
        assert_eq!(handle.kind(), RequestKind::LoadBoard);
        match wait(&handle) {
            ApiOutcome::Board(Ok(board)) => assert_eq!(board.rows.len(), 5),
            other => panic!("Unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_prediction_error_is_text() {
        let handle = ApiWorker::spawn(services(), ApiRequest::Predict(3));
        match wait(&handle) {
            ApiOutcome::Predicted {
                visit_id,
                result: Err(message),
            } => {
                assert_eq!(visit_id, 3);
                assert!(message.contains("Anamnesis"));
            }
            other => panic!("Unexpected outcome: {other:?}"),
        }
    }
}
