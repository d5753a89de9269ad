//! Main TUI application state machine.
//!
//! Handles:
//! - View navigation
//! - Input event handling
//! - Background API flows via worker threads

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};

use crate::application::OpenedPatient;
use crate::domain::{Patient, VisitQuery};
use crate::ports::ClinicalApi;
use crate::ClinicError;

use super::ui::{
    anamnesis::AnamnesisField,
    details::{render_details, DetailTab, DetailsState},
    patient_form::{render_patient_form, PatientField, PatientFormState},
    patients::render_patients,
    render_disclaimer, render_nav, step_selection,
    visits::{render_visits, BoardState},
    NavTab,
};
use super::worker::{
    ApiOutcome, ApiRequest, ApiWorker, ApiWorkerHandle, ClinicServices, RequestKind, WorkerPoll,
};

/// Visits fetched for the patient and visit lists.
const BOARD_LIMIT: u32 = 50;

/// Shown when a worker thread dies before reporting.
const WORKER_LOST: &str = "The request stopped unexpectedly. Please try again.";

/// A worker together with the details entry it was started under.
struct RunningFlow {
    entry: u64,
    handle: ApiWorkerHandle,
}

/// Current view of the application
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Patients,
    Visits,
    CreatePatient,
    PatientDetails {
        patient: Patient,
        visit_id: Option<i64>,
    },
}

impl View {
    /// Navigation tab highlighted for this view.
    #[must_use]
    pub fn nav_tab(&self) -> NavTab {
        match self {
            Self::Visits => NavTab::Visits,
            Self::Patients | Self::CreatePatient | Self::PatientDetails { .. } => NavTab::Patients,
        }
    }
}

/// Main application state
pub struct App<A>
where
    A: ClinicalApi,
{
    view: View,
    should_quit: bool,
    services: Arc<ClinicServices<A>>,
    /// Where the data comes from, shown in the header.
    backend_label: String,
    board: BoardState,
    patient_form: PatientFormState,
    details: DetailsState,
    opening_patient: bool,
    workers: Vec<RunningFlow>,
}

impl<A> App<A>
where
    A: ClinicalApi + 'static,
    A::Error: Into<ClinicError>,
{
    /// Create application with injected services.
    ///
    /// Starts loading the visit board right away.
    pub fn with_services(services: Arc<ClinicServices<A>>, backend_label: impl Into<String>) -> Self {
        let mut app = Self {
            view: View::Patients,
            should_quit: false,
            services,
            backend_label: backend_label.into(),
            board: BoardState::default(),
            patient_form: PatientFormState::default(),
            details: DetailsState::default(),
            opening_patient: false,
            workers: Vec::new(),
        };
        app.refresh_board();
        app
    }

    #[must_use]
    pub fn view(&self) -> &View {
        &self.view
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Whether any API flow is still running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        !self.workers.is_empty()
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.tick();

            terminal.draw(|f| self.draw(f))?;

            // Short poll to stay responsive
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Draw the current view with navigation and disclaimer.
    pub fn draw(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(f.area());

        let today = chrono::Local::now().date_naive();

        render_nav(
            f,
            chunks[0],
            self.view.nav_tab(),
            &self.backend_label,
            self.is_busy(),
        );

        match &self.view {
            View::Patients => {
                render_patients(f, chunks[1], &self.board, self.opening_patient, today);
            }
            View::Visits => render_visits(f, chunks[1], &self.board, today),
            View::CreatePatient => render_patient_form(f, chunks[1], &self.patient_form),
            View::PatientDetails { patient, visit_id } => {
                render_details(f, chunks[1], patient, *visit_id, &self.details, today);
            }
        }

        render_disclaimer(f, chunks[2]);
    }

    /// Collect finished flows and advance timers.
    pub fn tick(&mut self) {
        let mut outcomes = Vec::new();
        let mut lost = Vec::new();
        self.workers.retain(|flow| match flow.handle.poll() {
            WorkerPoll::Pending => true,
            WorkerPoll::Done(outcome) => {
                outcomes.push((flow.entry, outcome));
                false
            }
            WorkerPoll::Lost => {
                lost.push((flow.entry, flow.handle.kind()));
                false
            }
        });

        for (entry, outcome) in outcomes {
            self.apply(entry, outcome);
        }
        for (entry, kind) in lost {
            tracing::error!(?kind, "API worker exited without reporting a result");
            self.release(entry, kind);
        }

        if self.details.examinations.tick(Instant::now()) {
            tracing::debug!("Upload confirmation cleared");
        }
    }

    fn spawn(&mut self, request: ApiRequest) {
        tracing::debug!(?request, "Starting API flow");
        let handle = ApiWorker::spawn(Arc::clone(&self.services), request);
        self.workers.push(RunningFlow {
            entry: self.details.entry,
            handle,
        });
    }

    /// Clear the pending flag of a flow whose worker died.
    fn release(&mut self, entry: u64, kind: RequestKind) {
        match kind {
            RequestKind::LoadBoard => self.board.set_error(WORKER_LOST.to_string()),
            RequestKind::RegisterPatient => {
                self.patient_form.submitting = false;
                self.patient_form.error_message = Some(WORKER_LOST.to_string());
            }
            RequestKind::OpenPatient => self.opening_patient = false,
            // Per-visit flags belong to the entry that started the flow
            _ if entry != self.details.entry => {}
            RequestKind::LoadAnamnesis => self.details.anamnesis.load(None),
            RequestKind::SaveAnamnesis => {
                self.details.anamnesis.saving = false;
                self.details.anamnesis.error_message = Some(WORKER_LOST.to_string());
            }
            RequestKind::LoadExaminations => {
                self.details.examinations.loading_results = false;
                self.details.examinations.results_error = Some(WORKER_LOST.to_string());
            }
            RequestKind::UploadExamination => {
                self.details.examinations.uploading = false;
                self.details.examinations.error_message = Some(WORKER_LOST.to_string());
            }
            RequestKind::Predict => self
                .details
                .predictions
                .finish(Err(WORKER_LOST.to_string())),
        }
    }

    fn current_visit(&self) -> Option<i64> {
        match &self.view {
            View::PatientDetails { visit_id, .. } => *visit_id,
            _ => None,
        }
    }

    fn refresh_board(&mut self) {
        if self.board.loading {
            return;
        }
        self.board.loading = true;
        self.spawn(ApiRequest::LoadBoard(VisitQuery::recent(BOARD_LIMIT)));
    }

    fn show_list(&mut self, view: View) {
        self.view = view;
        self.refresh_board();
    }

    fn enter_details(&mut self, opened: OpenedPatient) {
        let OpenedPatient { patient, visit_id } = opened;
        tracing::info!(patient_id = patient.id, ?visit_id, "Opening patient");

        self.details = DetailsState {
            entry: self.details.entry + 1,
            ..DetailsState::default()
        };
        self.view = View::PatientDetails { patient, visit_id };

        if let Some(visit_id) = visit_id {
            self.details.anamnesis.loading = true;
            self.details.examinations.loading_results = true;
            self.spawn(ApiRequest::LoadAnamnesis(visit_id));
            self.spawn(ApiRequest::LoadExaminations(visit_id));
        }
    }

    fn apply(&mut self, entry: u64, outcome: ApiOutcome) {
        // Per-visit results only count for the entry that requested them
        let current_visit = if entry == self.details.entry {
            self.current_visit()
        } else {
            None
        };
        match outcome {
            ApiOutcome::Board(Ok(board)) => self.board.set_board(board),
            ApiOutcome::Board(Err(e)) => {
                tracing::error!("Failed to load visits: {}", e);
                self.board.set_error(e);
            }
            ApiOutcome::Registered(result) => {
                self.patient_form.submitting = false;
                match result {
                    Ok(opened) => {
                        self.patient_form.clear_sensitive();
                        if self.view == View::CreatePatient {
                            self.enter_details(opened);
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to register patient: {}", e);
                        self.patient_form.error_message =
                            Some(format!("Failed to register patient: {e}"));
                    }
                }
            }
            ApiOutcome::Opened(opened) => {
                self.opening_patient = false;
                if self.view == View::Patients {
                    self.enter_details(opened);
                }
            }
            ApiOutcome::AnamnesisLoaded {
                visit_id,
                anamnesis,
            } if current_visit == Some(visit_id) => {
                self.details.anamnesis.load(anamnesis);
            }
            ApiOutcome::AnamnesisSaved { visit_id, result } if current_visit == Some(visit_id) => {
                self.details.anamnesis.saving = false;
                match result {
                    Ok(()) => {
                        self.details.anamnesis.error_message = None;
                        self.details.tab = DetailTab::Predictions;
                    }
                    Err(e) => {
                        tracing::error!(visit_id, "Failed to save anamnesis: {}", e);
                        self.details.anamnesis.error_message =
                            Some(format!("Failed to save anamnesis: {e}"));
                    }
                }
            }
            ApiOutcome::ExaminationsLoaded { visit_id, result } if current_visit == Some(visit_id) => {
                let exams = &mut self.details.examinations;
                exams.loading_results = false;
                match result {
                    Ok(results) => {
                        exams.results = results;
                        exams.results_error = None;
                    }
                    Err(e) => {
                        tracing::warn!(visit_id, "Failed to load examinations: {}", e);
                        exams.results_error = Some(e);
                    }
                }
            }
            ApiOutcome::ExaminationUploaded { visit_id, result } if current_visit == Some(visit_id) => {
                match result {
                    Ok(_) => {
                        self.details.examinations.mark_uploaded(Instant::now());
                        self.details.examinations.loading_results = true;
                        self.spawn(ApiRequest::LoadExaminations(visit_id));
                    }
                    Err(e) => {
                        tracing::error!(visit_id, "Failed to upload examination: {}", e);
                        self.details.examinations.uploading = false;
                        self.details.examinations.error_message =
                            Some(format!("Upload failed: {e}"));
                    }
                }
            }
            ApiOutcome::Predicted { visit_id, result } if current_visit == Some(visit_id) => {
                self.details.predictions.finish(result);
            }
            stale => {
                tracing::debug!(?stale, "Dropping result for a view that is no longer open");
            }
        }
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.view {
            View::Patients | View::Visits => self.handle_list_key(key),
            View::CreatePatient => self.handle_patient_form_key(key),
            View::PatientDetails { .. } => self.handle_details_key(key, modifiers),
        }
    }

    fn handle_list_key(&mut self, key: KeyCode) {
        let on_patients = self.view == View::Patients;
        match key {
            KeyCode::Char('1') => self.show_list(View::Patients),
            KeyCode::Char('2') => self.show_list(View::Visits),
            KeyCode::Char('r') | KeyCode::Char('R') => self.refresh_board(),
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.patient_form.clear_sensitive();
                self.view = View::CreatePatient;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Up | KeyCode::Down => {
                let down = key == KeyCode::Down;
                if on_patients {
                    self.board.patient_selected =
                        step_selection(self.board.patient_selected, self.board.patients.len(), down);
                } else {
                    self.board.visit_selected =
                        step_selection(self.board.visit_selected, self.board.board.rows.len(), down);
                }
            }
            KeyCode::Enter if on_patients => {
                if self.opening_patient {
                    return;
                }
                if let Some(patient) = self.board.selected_patient().cloned() {
                    self.opening_patient = true;
                    self.spawn(ApiRequest::OpenPatient(patient));
                }
            }
            KeyCode::Enter => {
                if let Some(row) = self.board.selected_visit().cloned() {
                    let opened = self.services.visits.open_visit(row.patient, row.visit.id);
                    self.enter_details(opened);
                }
            }
            _ => {}
        }
    }

    fn handle_patient_form_key(&mut self, key: KeyCode) {
        let form = &mut self.patient_form;
        match key {
            KeyCode::Esc => self.show_list(View::Patients),
            KeyCode::Up | KeyCode::BackTab => form.prev_field(),
            KeyCode::Down | KeyCode::Tab => form.next_field(),
            KeyCode::Left | KeyCode::Right if form.field() == PatientField::Sex => form.cycle_sex(),
            KeyCode::Char(c) => form.input_char(c),
            KeyCode::Backspace => form.delete_char(),
            KeyCode::Enter => self.submit_patient_form(),
            _ => {}
        }
    }

    fn submit_patient_form(&mut self) {
        if self.patient_form.submitting {
            return;
        }
        match self.patient_form.to_patient_create() {
            Ok(create) => {
                self.patient_form.error_message = None;
                self.patient_form.submitting = true;
                self.spawn(ApiRequest::RegisterPatient(create));
            }
            Err(e) => self.patient_form.error_message = Some(e),
        }
    }

    fn handle_details_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        match key {
            KeyCode::Esc => {
                self.show_list(View::Patients);
                return;
            }
            KeyCode::Tab => {
                self.details.tab = self.details.tab.next();
                return;
            }
            KeyCode::BackTab => {
                self.details.tab = self.details.tab.prev();
                return;
            }
            _ => {}
        }

        let Some(visit_id) = self.current_visit() else {
            return;
        };
        let control = modifiers.contains(KeyModifiers::CONTROL);
        let submit = control && matches!(key, KeyCode::Char('s') | KeyCode::Char('S'));
        if control && !submit {
            return;
        }

        match self.details.tab {
            DetailTab::Anamnesis => self.handle_anamnesis_key(visit_id, key, submit),
            DetailTab::Examinations => self.handle_examination_key(visit_id, key, submit),
            DetailTab::Predictions => match key {
                KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char('R') => {
                    if !self.details.predictions.loading {
                        self.details.predictions.start();
                        self.spawn(ApiRequest::Predict(visit_id));
                    }
                }
                _ => {}
            },
        }
    }

    fn handle_anamnesis_key(&mut self, visit_id: i64, key: KeyCode, submit: bool) {
        let form = &mut self.details.anamnesis;
        if form.loading || form.saving {
            return;
        }
        if submit {
            form.saving = true;
            form.error_message = None;
            let anamnesis = form.record.clone();
            self.spawn(ApiRequest::SaveAnamnesis {
                visit_id,
                anamnesis,
            });
            return;
        }

        let toggles = matches!(
            form.field(),
            AnamnesisField::Sex | AnamnesisField::FamilyHistory | AnamnesisField::Smoking
        );
        match key {
            KeyCode::Up => form.prev_field(),
            KeyCode::Down => form.next_field(),
            KeyCode::Left | KeyCode::Right if toggles => form.toggle(),
            KeyCode::Enter => form.enter(),
            KeyCode::Delete => form.remove_last(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.input_char(c),
            _ => {}
        }
    }

    fn handle_examination_key(&mut self, visit_id: i64, key: KeyCode, submit: bool) {
        let exams = &mut self.details.examinations;
        if exams.uploading || exams.success_until.is_some() {
            return;
        }
        if submit {
            if exams.can_submit() {
                exams.uploading = true;
                exams.error_message = None;
                let draft = exams.draft.clone();
                self.spawn(ApiRequest::UploadExamination { visit_id, draft });
            } else {
                exams.error_message = exams.draft.ready().err().or_else(|| {
                    Some("Examination file not found".to_string())
                });
            }
            return;
        }

        match key {
            KeyCode::Up => exams.prev_field(),
            KeyCode::Down | KeyCode::Enter => exams.next_field(),
            KeyCode::Backspace => exams.backspace(),
            KeyCode::Char(c) => exams.input_char(c),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    use crate::adapters::{MockClinicalApi, MockError};
    use crate::domain::{
        Anamnesis, AnamnesisList, AnamnesisSaved, ExamResult, ExaminationUpload,
        ExaminationUploaded, Patient, PatientCreate, Predictions, Visit, VisitCreate,
        VisitCreated,
    };

    fn app() -> App<MockClinicalApi> {
        let api = Arc::new(MockClinicalApi::new().with_latency(Duration::ZERO));
        let services = Arc::new(ClinicServices::new(api, Some("dr_test".to_string())));
        let mut app = App::with_services(services, "mock data");
        settle(&mut app);
        app
    }

    fn settle<A>(app: &mut App<A>)
    where
        A: ClinicalApi + 'static,
        A::Error: Into<ClinicError>,
    {
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.is_busy() {
            assert!(Instant::now() < deadline, "API flows did not finish");
            std::thread::sleep(Duration::from_millis(5));
            app.tick();
        }
    }

    fn press<A>(app: &mut App<A>, key: KeyCode)
    where
        A: ClinicalApi + 'static,
        A::Error: Into<ClinicError>,
    {
        app.handle_key(key, KeyModifiers::NONE);
    }

    fn type_text(app: &mut App<MockClinicalApi>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn screen_text(app: &App<MockClinicalApi>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).expect("Terminal");
        terminal.draw(|f| app.draw(f)).expect("Should draw");
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_startup_loads_board() {
        let app = app();
        assert_eq!(app.view(), &View::Patients);
        assert_eq!(app.board.patients.len(), 4);
        assert_eq!(app.board.board.rows.len(), 5);
    }

    #[test]
    fn test_nav_highlight_mapping() {
        assert_eq!(View::CreatePatient.nav_tab(), NavTab::Patients);
        assert_eq!(View::Visits.nav_tab(), NavTab::Visits);
    }

    #[test]
    fn test_register_patient_opens_new_visit() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.view(), &View::CreatePatient);
        press(&mut app, KeyCode::Down);
        type_text(&mut app, "40");
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        match app.view() {
            View::PatientDetails { patient, visit_id } => {
                assert_eq!(patient.id, 5);
                assert_eq!(patient.recorded_age, Some(40));
                assert_eq!(*visit_id, Some(6));
            }
            other => panic!("Unexpected view: {other:?}"),
        }
        // No saved anamnesis yet: blank form
        assert!(!app.details.anamnesis.loading);
        assert!(app.details.anamnesis.record.items(AnamnesisList::Complaints).is_empty());
        assert!(app.patient_form.age.is_empty());
    }

    #[test]
    fn test_open_patient_uses_latest_visit() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        settle(&mut app);
        match app.view() {
            View::PatientDetails { patient, visit_id } => {
                assert_eq!(patient.id, 1);
                assert_eq!(*visit_id, Some(5));
            }
            other => panic!("Unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_visit_list_prefills_anamnesis() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        settle(&mut app);
        assert_eq!(app.view(), &View::Visits);

        // Rows are newest first: 5, 4, 3, 2, 1
        for _ in 0..3 {
            press(&mut app, KeyCode::Down);
        }
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert_eq!(app.current_visit(), Some(2));
        assert_eq!(
            app.details.anamnesis.record.items(AnamnesisList::Complaints)[0],
            "Headaches"
        );
        assert_eq!(app.details.examinations.results.len(), 1);
    }

    #[test]
    fn test_saving_anamnesis_switches_to_predictions() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        settle(&mut app);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        settle(&mut app);
        assert_eq!(app.current_visit(), Some(3));

        // Last field is the complaints list
        press(&mut app, KeyCode::Up);
        type_text(&mut app, "Morning headache");
        press(&mut app, KeyCode::Enter);
        app.handle_key(KeyCode::Char('s'), KeyModifiers::CONTROL);
        settle(&mut app);
        assert_eq!(app.details.tab, DetailTab::Predictions);

        press(&mut app, KeyCode::Enter);
        settle(&mut app);
        let predictions = app
            .details
            .predictions
            .predictions
            .as_ref()
            .expect("Prediction received");
        assert_eq!(predictions.suggestions[0].disease_name, "Tension-type headache");
    }

    #[test]
    fn test_upload_examination_refreshes_list() {
        let dir = tempfile::tempdir().expect("Temp dir");
        let path = dir.path().join("knee.jpg");
        std::fs::write(&path, [0u8; 512]).expect("Write file");

        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        settle(&mut app);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        settle(&mut app);
        assert_eq!(app.current_visit(), Some(4));
        assert!(app.details.examinations.results.is_empty());

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.details.tab, DetailTab::Examinations);

        // Incomplete form is refused locally
        app.handle_key(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert!(!app.is_busy());
        assert!(app.details.examinations.error_message.is_some());

        type_text(&mut app, "Knee X-ray");
        press(&mut app, KeyCode::Down);
        type_text(&mut app, &path.to_string_lossy());
        assert!(app.details.examinations.can_submit());

        app.handle_key(KeyCode::Char('s'), KeyModifiers::CONTROL);
        settle(&mut app);

        let exams = &app.details.examinations;
        assert!(exams.success_until.is_some());
        assert_eq!(exams.results.len(), 1);
        assert_eq!(exams.results[0].examination_name, "Knee X-ray");
    }

    #[test]
    fn test_prediction_without_anamnesis_shows_hint() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        settle(&mut app);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        settle(&mut app);
        assert_eq!(app.current_visit(), Some(4));

        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.details.tab, DetailTab::Predictions);
        press(&mut app, KeyCode::Enter);
        settle(&mut app);
        assert!(app.details.predictions.error.is_some());
        assert!(screen_text(&app).contains("Make sure the anamnesis"));
    }

    #[test]
    fn test_escape_returns_to_patients() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        settle(&mut app);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view(), &View::Patients);
        settle(&mut app);
    }

    #[test]
    fn test_disclaimer_on_every_view() {
        let mut app = app();
        assert!(screen_text(&app).contains("DISCLAIMER"));
        press(&mut app, KeyCode::Char('2'));
        settle(&mut app);
        assert!(screen_text(&app).contains("DISCLAIMER"));
        press(&mut app, KeyCode::Char('n'));
        assert!(screen_text(&app).contains("DISCLAIMER"));
        press(&mut app, KeyCode::Esc);
        settle(&mut app);
        press(&mut app, KeyCode::Enter);
        settle(&mut app);
        assert!(screen_text(&app).contains("DISCLAIMER"));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit());

        let mut app = app_in_form();
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit());
    }

    /// Mock backend whose prediction call takes the worker thread down.
    struct CrashingPredict(MockClinicalApi);

    impl ClinicalApi for CrashingPredict {
        type Error = MockError;

        fn create_patient(&self, patient: &PatientCreate) -> Result<Patient, MockError> {
            self.0.create_patient(patient)
        }

        fn get_patient(&self, patient_id: i64) -> Result<Patient, MockError> {
            self.0.get_patient(patient_id)
        }

        fn create_visit(&self, visit: &VisitCreate) -> Result<VisitCreated, MockError> {
            self.0.create_visit(visit)
        }

        fn list_visits(&self, query: &VisitQuery) -> Result<Vec<Visit>, MockError> {
            self.0.list_visits(query)
        }

        fn get_visit(&self, visit_id: i64) -> Result<Visit, MockError> {
            self.0.get_visit(visit_id)
        }

        fn upload_anamnesis(
            &self,
            visit_id: i64,
            anamnesis: &Anamnesis,
        ) -> Result<AnamnesisSaved, MockError> {
            self.0.upload_anamnesis(visit_id, anamnesis)
        }

        fn get_anamnesis(&self, visit_id: i64) -> Result<Anamnesis, MockError> {
            self.0.get_anamnesis(visit_id)
        }

        fn upload_examination(
            &self,
            visit_id: i64,
            upload: &ExaminationUpload,
        ) -> Result<ExaminationUploaded, MockError> {
            self.0.upload_examination(visit_id, upload)
        }

        fn list_examinations(&self, visit_id: i64) -> Result<Vec<ExamResult>, MockError> {
            self.0.list_examinations(visit_id)
        }

        fn predict(&self, visit_id: i64) -> Result<Predictions, MockError> {
            panic!("prediction backend crashed for visit {visit_id}");
        }
    }

    #[test]
    fn test_crashed_worker_releases_prediction() {
        let api = CrashingPredict(MockClinicalApi::new().with_latency(Duration::ZERO));
        let services = Arc::new(ClinicServices::new(Arc::new(api), Some("dr_test".to_string())));
        let mut app = App::with_services(services, "mock data");
        settle(&mut app);

        press(&mut app, KeyCode::Enter);
        settle(&mut app);
        assert!(app.current_visit().is_some());

        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.details.tab, DetailTab::Predictions);
        press(&mut app, KeyCode::Enter);
        assert!(app.details.predictions.loading);
        settle(&mut app);

        assert!(!app.details.predictions.loading);
        assert!(app.details.predictions.error.is_some());

        // The flow can be started again
        press(&mut app, KeyCode::Enter);
        assert!(app.details.predictions.loading);
        settle(&mut app);
        assert!(!app.details.predictions.loading);
    }

    #[test]
    fn test_upload_result_from_previous_entry_is_dropped() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        settle(&mut app);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        settle(&mut app);
        assert_eq!(app.current_visit(), Some(4));
        let first_entry = app.details.entry;

        // Leave and reopen the same visit
        press(&mut app, KeyCode::Esc);
        settle(&mut app);
        press(&mut app, KeyCode::Char('2'));
        settle(&mut app);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        settle(&mut app);
        assert_eq!(app.current_visit(), Some(4));
        assert!(app.details.entry > first_entry);

        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "CT");

        // An upload started under the first entry lands now
        app.apply(
            first_entry,
            ApiOutcome::ExaminationUploaded {
                visit_id: 4,
                result: Ok(ExaminationUploaded {
                    s3_path: "visits/4/knee.jpg".to_string(),
                    visit_examination_id: 1,
                }),
            },
        );
        app.apply(
            first_entry,
            ApiOutcome::ExaminationsLoaded {
                visit_id: 4,
                result: Err("timed out".to_string()),
            },
        );

        let exams = &app.details.examinations;
        assert!(exams.success_until.is_none());
        assert!(!exams.uploading);
        assert!(!exams.loading_results);
        assert!(exams.results_error.is_none());
        assert!(!app.is_busy());
    }

    fn app_in_form() -> App<MockClinicalApi> {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        // A plain `q` is typed into the form, not treated as quit
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit());
        app
    }
}
