//! AI diagnostics tab: suggestions and referrals for the visit.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::{DiagnosisSuggestion, Predictions};
use crate::tui::styles::ClinicTheme;

use super::render_footer;

/// Shown when the prediction request fails.
pub const PREDICTION_FAILED: &str =
    "Failed to get a prediction. Make sure the anamnesis has been filled in.";

/// Predictions tab state
#[derive(Debug, Default)]
pub struct PredictionState {
    pub loading: bool,
    pub error: Option<String>,
    pub predictions: Option<Predictions>,
}

impl PredictionState {
    pub fn start(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn finish(&mut self, result: Result<Predictions, String>) {
        self.loading = false;
        match result {
            Ok(predictions) => {
                self.predictions = Some(predictions);
                self.error = None;
            }
            Err(e) => {
                tracing::warn!("Prediction failed: {}", e);
                self.error = Some(PREDICTION_FAILED.to_string());
            }
        }
    }
}

/// Render the predictions tab
pub fn render_predictions(f: &mut Frame, area: Rect, state: &PredictionState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(area);

    let block = Block::default()
        .title(Span::styled(" AI diagnostics ", ClinicTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(ClinicTheme::border());
    let inner = block.inner(chunks[0]);
    f.render_widget(block, chunks[0]);

    let mut body = inner;
    if let Some(err) = &state.error {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(0)])
            .split(inner);
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(format!(" {err}"), ClinicTheme::danger())))
                .wrap(Wrap { trim: true }),
            parts[0],
        );
        body = parts[1];
    }

    if state.loading {
        let p = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Analysing patient data...",
                ClinicTheme::info(),
            )),
        ])
        .alignment(Alignment::Center);
        f.render_widget(p, body);
    } else {
        match &state.predictions {
            None => {
                let p = Paragraph::new(vec![
                    Line::from(""),
                    Line::from(vec![
                        Span::styled("Press ", ClinicTheme::text_secondary()),
                        Span::styled("Enter", ClinicTheme::key_hint()),
                        Span::styled(" to request a prediction", ClinicTheme::text_secondary()),
                    ]),
                ])
                .alignment(Alignment::Center);
                f.render_widget(p, body);
            }
            Some(predictions) if predictions.is_empty() => {
                let p = Paragraph::new(vec![
                    Line::from(""),
                    Line::from(Span::styled(
                        "Insufficient data for a prediction",
                        ClinicTheme::warning(),
                    )),
                    Line::from(Span::styled(
                        "Add more anamnesis details or examination results.",
                        ClinicTheme::text_muted(),
                    )),
                ])
                .alignment(Alignment::Center);
                f.render_widget(p, body);
            }
            Some(predictions) => render_results(f, body, predictions),
        }
    }

    let hints: &[(&str, &str)] = match (&state.predictions, state.loading) {
        (_, true) => &[("", "Analysing...")],
        (Some(_), false) => &[("r", "Refresh prediction"), ("Tab", "Next tab"), ("Esc", "Back")],
        (None, false) => &[("Enter", "Get prediction"), ("Tab", "Next tab"), ("Esc", "Back")],
    };
    render_footer(f, chunks[1], None, hints);
}

/// Rows reserved for the referral block: two per referral plus a heading.
fn referral_rows(referrals: usize) -> u16 {
    if referrals == 0 {
        return 0;
    }
    u16::try_from(referrals)
        .unwrap_or(u16::MAX)
        .saturating_mul(2)
        .saturating_add(1)
}

fn render_results(f: &mut Frame, area: Rect, predictions: &Predictions) {
    let referral_height = referral_rows(predictions.referrals.len());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(referral_height),
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            " Suspected diagnoses",
            ClinicTheme::title(),
        ))),
        chunks[0],
    );

    // Three rows per suggestion, in the order the server sent them
    let constraints: Vec<Constraint> = predictions
        .suggestions
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(chunks[1]);

    for (suggestion, row) in predictions.suggestions.iter().zip(rows.iter()) {
        render_suggestion(f, *row, suggestion);
    }

    if referral_height > 0 {
        let mut lines = vec![Line::from(Span::styled(
            " Recommended examinations",
            ClinicTheme::title(),
        ))];
        for referral in &predictions.referrals {
            lines.push(Line::from(vec![
                Span::styled("  • ", ClinicTheme::info()),
                Span::styled(referral.specialty.clone(), ClinicTheme::text()),
            ]));
            lines.push(Line::from(Span::styled(
                format!("    {}", referral.note.clone().unwrap_or_default()),
                ClinicTheme::text_muted(),
            )));
        }
        f.render_widget(Paragraph::new(lines), chunks[2]);
    }
}

fn render_suggestion(f: &mut Frame, area: Rect, suggestion: &DiagnosisSuggestion) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let band = suggestion.band();
    let style = ClinicTheme::band(band);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format!("  {} ", band.marker()), style),
            Span::styled(suggestion.disease_name.clone(), ClinicTheme::text()),
            Span::styled(format!("  {}", suggestion.percent_label()), style),
        ])),
        parts[0],
    );

    let gauge = Gauge::default()
        .gauge_style(style)
        .percent(suggestion.gauge_percent())
        .label("");
    let gauge_area = Rect {
        x: parts[1].x + 4,
        width: parts[1].width.saturating_sub(4).min(40),
        ..parts[1]
    };
    f.render_widget(gauge, gauge_area);

    if let Some(rationale) = &suggestion.rationale {
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!("    {rationale}"),
                ClinicTheme::text_muted(),
            ))),
            parts[2],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    use crate::domain::ReferralSuggestion;

    fn screen_text(state: &PredictionState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("Terminal");
        terminal
            .draw(|f| render_predictions(f, f.area(), state))
            .expect("Should draw");
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

    fn suggestion(name: &str, probability: f64) -> DiagnosisSuggestion {
        DiagnosisSuggestion {
            disease_name: name.to_string(),
            probability,
            rationale: None,
        }
    }

    #[test]
    fn test_renders_server_order() {
        let state = PredictionState {
            loading: false,
            error: None,
            predictions: Some(Predictions {
                suggestions: vec![
                    suggestion("Coronary artery disease", 0.85),
                    suggestion("Arterial hypertension", 0.92),
                    suggestion("Dyslipidemia", 0.78),
                ],
                referrals: vec![ReferralSuggestion {
                    specialty: "Cardiologist".to_string(),
                    note: Some("Risk assessment".to_string()),
                }],
            }),
        };
        let text = screen_text(&state);

        let first = text.find("Coronary artery disease").expect("First shown");
        let second = text.find("Arterial hypertension").expect("Second shown");
        let third = text.find("Dyslipidemia").expect("Third shown");
        assert!(first < second && second < third);
        assert!(text.contains("85.0%"));
        assert!(text.contains("92.0%"));
        assert!(text.contains("Cardiologist"));
    }

    #[test]
    fn test_empty_prediction_notice() {
        let state = PredictionState {
            predictions: Some(Predictions::default()),
            ..Default::default()
        };
        assert!(screen_text(&state).contains("Insufficient data for a prediction"));
    }

    #[test]
    fn test_failure_message() {
        let mut state = PredictionState::default();
        state.start();
        assert!(state.loading);
        state.finish(Err("Anamnesis not found".to_string()));
        assert!(!state.loading);
        assert!(screen_text(&state).contains("Make sure the anamnesis"));
    }

    #[test]
    fn test_referral_rows_saturate() {
        assert_eq!(referral_rows(0), 0);
        assert_eq!(referral_rows(2), 5);
        assert_eq!(referral_rows(40_000), u16::MAX);
        assert_eq!(referral_rows(usize::MAX), u16::MAX);
    }
}
