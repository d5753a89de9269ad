//! Patient details: header plus the per-visit record tabs.

use chrono::NaiveDate;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::domain::{sex_label, Patient};
use crate::tui::styles::ClinicTheme;

use super::anamnesis::{render_anamnesis, AnamnesisFormState};
use super::examination::{render_examinations, ExaminationState};
use super::prediction::{render_predictions, PredictionState};
use super::render_footer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Anamnesis,
    Examinations,
    Predictions,
}

impl DetailTab {
    pub const ALL: [DetailTab; 3] = [Self::Anamnesis, Self::Examinations, Self::Predictions];

    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Anamnesis => "Anamnesis",
            Self::Examinations => "Examinations",
            Self::Predictions => "AI diagnostics",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// State of the three record tabs for the open visit.
#[derive(Debug, Default)]
pub struct DetailsState {
    /// Increases each time a patient is opened; results started under an
    /// older entry are dropped.
    pub entry: u64,
    pub tab: DetailTab,
    pub anamnesis: AnamnesisFormState,
    pub examinations: ExaminationState,
    pub predictions: PredictionState,
}

/// Render the patient details view
pub fn render_details(
    f: &mut Frame,
    area: Rect,
    patient: &Patient,
    visit_id: Option<i64>,
    state: &DetailsState,
    today: NaiveDate,
) {
    let Some(visit_id) = visit_id else {
        render_no_visit(f, area, patient);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Patient header
            Constraint::Length(2), // Tabs
            Constraint::Min(0),    // Tab content
        ])
        .split(area);

    render_patient_header(f, chunks[0], patient, visit_id, today);

    let titles: Vec<Line> = DetailTab::ALL
        .iter()
        .map(|t| Line::from(format!(" {} ", t.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(state.tab.index())
        .style(ClinicTheme::text_secondary())
        .highlight_style(ClinicTheme::selected())
        .divider("│")
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(ClinicTheme::border()),
        );
    f.render_widget(tabs, chunks[1]);

    match state.tab {
        DetailTab::Anamnesis => render_anamnesis(f, chunks[2], &state.anamnesis),
        DetailTab::Examinations => render_examinations(f, chunks[2], &state.examinations),
        DetailTab::Predictions => render_predictions(f, chunks[2], &state.predictions),
    }
}

fn render_patient_header(
    f: &mut Frame,
    area: Rect,
    patient: &Patient,
    visit_id: i64,
    today: NaiveDate,
) {
    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(format!(" Patient #{}", patient.id), ClinicTheme::title()),
            Span::styled(format!("  │ Visit #{visit_id}"), ClinicTheme::text_secondary()),
        ]),
        Line::from(vec![
            Span::styled(" Age: ", ClinicTheme::text_muted()),
            Span::styled(patient.age_label(today), ClinicTheme::text()),
            Span::styled("   Sex: ", ClinicTheme::text_muted()),
            Span::styled(sex_label(patient.sex), ClinicTheme::text()),
            Span::styled("   Registered: ", ClinicTheme::text_muted()),
            Span::styled(patient.registered_on(), ClinicTheme::text()),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(ClinicTheme::border()),
    );
    f.render_widget(header, area);
}

fn render_no_visit(f: &mut Frame, area: Rect, patient: &Patient) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(area);

    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Patient #{}", patient.id),
            ClinicTheme::title(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Could not find or create a visit for this patient.",
            ClinicTheme::warning(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(ClinicTheme::border()),
    );
    f.render_widget(content, chunks[0]);

    render_footer(f, chunks[1], None, &[("Esc", "Back to list")]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_cycle() {
        assert_eq!(DetailTab::Anamnesis.next(), DetailTab::Examinations);
        assert_eq!(DetailTab::Predictions.next(), DetailTab::Anamnesis);
        assert_eq!(DetailTab::Anamnesis.prev(), DetailTab::Predictions);
    }
}
