//! Visit list view and the board state it shares with the patient list.

use chrono::NaiveDate;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::application::{VisitBoard, VisitRow};
use crate::domain::{format_api_date, Patient};
use crate::tui::styles::ClinicTheme;

use super::render_footer;

/// Recent visits with their patients, as loaded from the API.
#[derive(Debug, Default)]
pub struct BoardState {
    pub board: VisitBoard,
    pub patients: Vec<Patient>,
    pub loading: bool,
    pub error: Option<String>,
    pub patient_selected: usize,
    pub visit_selected: usize,
}

impl BoardState {
    /// Replace the board, keeping selections in range.
    pub fn set_board(&mut self, board: VisitBoard) {
        self.patients = board.patients();
        self.board = board;
        self.loading = false;
        self.error = None;
        self.patient_selected = self
            .patient_selected
            .min(self.patients.len().saturating_sub(1));
        self.visit_selected = self
            .visit_selected
            .min(self.board.rows.len().saturating_sub(1));
    }

    pub fn set_error(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    #[must_use]
    pub fn selected_patient(&self) -> Option<&Patient> {
        self.patients.get(self.patient_selected)
    }

    #[must_use]
    pub fn selected_visit(&self) -> Option<&VisitRow> {
        self.board.rows.get(self.visit_selected)
    }
}

/// Placeholder shown while loading, on error or when the list is empty.
pub(crate) fn render_notice(f: &mut Frame, area: Rect, title: &str, message: Line<'static>) {
    let content = Paragraph::new(vec![Line::from(""), message])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title(Span::styled(format!(" {title} "), ClinicTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(ClinicTheme::border()),
        );
    f.render_widget(content, area);
}

/// Render the list of all visits
pub fn render_visits(f: &mut Frame, area: Rect, state: &BoardState, today: NaiveDate) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(area);

    render_visit_table(f, chunks[0], state, today);
    render_footer(
        f,
        chunks[1],
        None,
        &[("↑↓", "Select"), ("Enter", "Open"), ("n", "New patient"), ("q", "Quit")],
    );
}

fn render_visit_table(f: &mut Frame, area: Rect, state: &BoardState, today: NaiveDate) {
    if state.loading && state.board.is_empty() {
        render_notice(
            f,
            area,
            "All visits",
            Line::from(Span::styled("Loading visits...", ClinicTheme::text_secondary())),
        );
        return;
    }
    if let Some(err) = &state.error {
        render_notice(
            f,
            area,
            "All visits",
            Line::from(Span::styled(
                format!("Failed to load visits: {err}"),
                ClinicTheme::danger(),
            )),
        );
        return;
    }
    if state.board.is_empty() {
        render_notice(
            f,
            area,
            "All visits",
            Line::from(Span::styled(
                "No visits have been registered yet.",
                ClinicTheme::text_secondary(),
            )),
        );
        return;
    }

    let rows: Vec<Row> = state
        .board
        .rows
        .iter()
        .map(|row| {
            let patient = &row.patient;
            let visit = &row.visit;
            Row::new(vec![
                Cell::from(format!("#{}", visit.id)),
                Cell::from(format!("Patient #{}", patient.id)),
                Cell::from(patient.sex.map_or("", |s| s.short_label())),
                Cell::from(patient.age_label(today)),
                Cell::from(Span::styled(
                    visit.status.clone(),
                    ClinicTheme::status(visit.status_kind()),
                )),
                Cell::from(visit.doctor_id.clone().unwrap_or_default()),
                Cell::from(format_api_date(&visit.created_at)),
            ])
        })
        .collect();

    let mut title = vec![Span::styled(" All visits ", ClinicTheme::subtitle())];
    if !state.board.missing_patients.is_empty() {
        title.push(Span::styled(
            format!("({} patients unavailable) ", state.board.missing_patients.len()),
            ClinicTheme::warning(),
        ));
    }

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(14),
            Constraint::Length(3),
            Constraint::Length(18),
            Constraint::Length(13),
            Constraint::Length(10),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["Visit", "Patient", "Sex", "Age", "Status", "Doctor", "Date"])
            .style(ClinicTheme::text_secondary()),
    )
    .row_highlight_style(ClinicTheme::selected())
    .style(ClinicTheme::text())
    .block(
        Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_style(ClinicTheme::border()),
    );

    let mut table_state = TableState::default().with_selected(Some(state.visit_selected));
    f.render_stateful_widget(table, area, &mut table_state);
}
