//! UI module: View components for the TUI.

pub mod anamnesis;
pub mod details;
pub mod examination;
pub mod patient_form;
pub mod patients;
pub mod prediction;
pub mod visits;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::{ClinicTheme, APP_NAME};

/// Top-level navigation tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTab {
    Patients,
    Visits,
}

/// Header bar with the navigation tabs and the API the app is talking to.
pub fn render_nav(f: &mut Frame, area: Rect, active: NavTab, backend: &str, busy: bool) {
    let tab = |key: &'static str, label: &'static str, tab: NavTab| {
        let style = if tab == active {
            ClinicTheme::selected()
        } else {
            ClinicTheme::header()
        };
        vec![
            Span::styled(format!(" [{key}] "), style),
            Span::styled(format!("{label} "), style),
        ]
    };

    let mut spans = vec![Span::styled(format!(" {APP_NAME} "), ClinicTheme::header())];
    spans.push(Span::raw(" "));
    spans.extend(tab("1", "Patients", NavTab::Patients));
    spans.push(Span::raw(" "));
    spans.extend(tab("2", "Visits", NavTab::Visits));
    spans.push(Span::styled(
        format!("   {backend}"),
        ClinicTheme::text_muted(),
    ));
    if busy {
        spans.push(Span::styled("  working...", ClinicTheme::info()));
    }

    let nav = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ClinicTheme::border()),
    );
    f.render_widget(nav, area);
}

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "DISCLAIMER: AI suggestions are indicative only and do not replace professional medical evaluation.",
            ClinicTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "Final diagnosis and treatment decisions rest with the attending physician.",
            ClinicTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(ClinicTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}

/// Key hint line, `[key] description` pairs. An empty key prints the description alone.
pub(crate) fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let spans: Vec<Span<'static>> = hints
        .iter()
        .flat_map(|(key, desc)| {
            let key = if key.is_empty() {
                String::new()
            } else {
                format!("[{key}] ")
            };
            [
                Span::styled(key, ClinicTheme::key_hint()),
                Span::styled(format!("{desc} "), ClinicTheme::key_desc()),
            ]
        })
        .collect();
    Line::from(spans)
}

/// Footer with either an error or the key hints.
pub(crate) fn render_footer(
    f: &mut Frame,
    area: Rect,
    error: Option<&str>,
    hints: &[(&str, &str)],
) {
    let content = match error {
        Some(err) => Line::from(vec![
            Span::styled("! ", ClinicTheme::danger()),
            Span::styled(err.to_string(), ClinicTheme::danger()),
        ]),
        None => key_hints(hints),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(ClinicTheme::border()),
    );
    f.render_widget(footer, area);
}

/// Keep a list selection inside `len` items.
pub(crate) fn step_selection(selected: usize, len: usize, down: bool) -> usize {
    if len == 0 {
        return 0;
    }
    if down {
        (selected + 1).min(len - 1)
    } else {
        selected.saturating_sub(1)
    }
}
