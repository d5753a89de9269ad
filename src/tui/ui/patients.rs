//! Patient list view: distinct patients of the recent visits.

use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::tui::styles::ClinicTheme;

use super::render_footer;
use super::visits::{render_notice, BoardState};

/// Render the patient list
pub fn render_patients(
    f: &mut Frame,
    area: Rect,
    state: &BoardState,
    opening: bool,
    today: NaiveDate,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(area);

    render_patient_table(f, chunks[0], state, today);

    let hints: &[(&str, &str)] = if opening {
        &[("", "Opening patient...")]
    } else {
        &[("↑↓", "Select"), ("Enter", "Open"), ("n", "New patient"), ("q", "Quit")]
    };
    render_footer(f, chunks[1], None, hints);
}

fn render_patient_table(f: &mut Frame, area: Rect, state: &BoardState, today: NaiveDate) {
    if state.loading && state.patients.is_empty() {
        render_notice(
            f,
            area,
            "Patients",
            Line::from(Span::styled("Loading patients...", ClinicTheme::text_secondary())),
        );
        return;
    }
    if let Some(err) = &state.error {
        render_notice(
            f,
            area,
            "Patients",
            Line::from(Span::styled(
                format!("Failed to load patients: {err}"),
                ClinicTheme::danger(),
            )),
        );
        return;
    }
    if state.patients.is_empty() {
        render_notice(
            f,
            area,
            "Patients",
            Line::from(vec![
                Span::styled("No patients yet. Press ", ClinicTheme::text_secondary()),
                Span::styled("n", ClinicTheme::key_hint()),
                Span::styled(" to register one.", ClinicTheme::text_secondary()),
            ]),
        );
        return;
    }

    let rows: Vec<Row> = state
        .patients
        .iter()
        .map(|p| {
            Row::new(vec![
                Cell::from(format!("Patient #{}", p.id)),
                Cell::from(p.sex.map_or("", |s| s.short_label())),
                Cell::from(p.age_label(today)),
                Cell::from(p.registered_on()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(4),
            Constraint::Length(18),
            Constraint::Min(12),
        ],
    )
    .header(
        Row::new(vec!["Patient", "Sex", "Age", "Registered"]).style(ClinicTheme::text_secondary()),
    )
    .row_highlight_style(ClinicTheme::selected())
    .style(ClinicTheme::text())
    .block(
        Block::default()
            .title(Span::styled(" Patients ", ClinicTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(ClinicTheme::border()),
    );

    let mut table_state = TableState::default().with_selected(Some(state.patient_selected));
    f.render_stateful_widget(table, area, &mut table_state);
}
