//! Examination upload tab and the list of uploaded results.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::domain::{format_api_date, format_size_mb, ExamResult, ExaminationDraft, FileKind};
use crate::tui::styles::ClinicTheme;

use super::render_footer;

/// How long the upload confirmation stays on screen.
pub const SUCCESS_DISPLAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamField {
    Name,
    File,
    Text,
}

impl ExamField {
    pub const ALL: [ExamField; 3] = [Self::Name, Self::File, Self::Text];

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Examination type",
            Self::File => "File path",
            Self::Text => "Result description (optional)",
        }
    }

    #[must_use]
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Name => "e.g. ECG, blood panel, chest X-ray",
            Self::File => "/path/to/result.pdf",
            Self::Text => "Short summary of the findings",
        }
    }
}

/// Size and kind of the selected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedFile {
    pub size: u64,
    pub kind: FileKind,
}

/// Examinations tab state
#[derive(Debug, Default)]
pub struct ExaminationState {
    pub draft: ExaminationDraft,
    /// Path as typed; the draft only holds it once it names a file.
    pub file_input: String,
    pub selected_file: Option<SelectedFile>,
    pub selected_field: usize,
    pub uploading: bool,
    pub success_until: Option<Instant>,
    pub error_message: Option<String>,
    pub results: Vec<ExamResult>,
    pub loading_results: bool,
    pub results_error: Option<String>,
}

impl ExaminationState {
    #[must_use]
    pub fn field(&self) -> ExamField {
        ExamField::ALL[self.selected_field]
    }

    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % ExamField::ALL.len();
    }

    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = ExamField::ALL.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    pub fn input_char(&mut self, c: char) {
        match self.field() {
            ExamField::Name => self.draft.examination_name.push(c),
            ExamField::File => {
                self.file_input.push(c);
                self.refresh_file();
            }
            ExamField::Text => self.draft.result_text.push(c),
        }
        self.error_message = None;
    }

    pub fn backspace(&mut self) {
        match self.field() {
            ExamField::Name => {
                self.draft.examination_name.pop();
            }
            ExamField::File => {
                self.file_input.pop();
                self.refresh_file();
            }
            ExamField::Text => {
                self.draft.result_text.pop();
            }
        }
    }

    /// Re-check the typed path against the filesystem.
    pub fn refresh_file(&mut self) {
        let path = PathBuf::from(self.file_input.trim());
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {
                self.selected_file = Some(SelectedFile {
                    size: meta.len(),
                    kind: FileKind::of(&path),
                });
                self.draft.file = Some(path);
            }
            _ => {
                self.selected_file = None;
                self.draft.file = None;
            }
        }
    }

    /// Whether the submit action is enabled.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.draft.is_ready() && !self.uploading && self.success_until.is_none()
    }

    /// Upload accepted: show the confirmation until `now + SUCCESS_DISPLAY`.
    pub fn mark_uploaded(&mut self, now: Instant) {
        self.uploading = false;
        self.error_message = None;
        self.success_until = Some(now + SUCCESS_DISPLAY);
    }

    /// Clear the confirmation and the draft once the display time is over.
    ///
    /// Returns `true` when the form was reset.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.success_until {
            Some(until) if now >= until => {
                self.success_until = None;
                self.draft = ExaminationDraft::default();
                self.file_input.clear();
                self.selected_file = None;
                self.selected_field = 0;
                true
            }
            _ => false,
        }
    }
}

/// Render the examinations tab
pub fn render_examinations(f: &mut Frame, area: Rect, state: &ExaminationState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(11),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(area);

    if state.success_until.is_some() {
        render_success(f, chunks[0]);
    } else {
        render_upload_form(f, chunks[0], state);
    }
    render_results(f, chunks[1], state);

    let hints: &[(&str, &str)] = if state.uploading {
        &[("", "Uploading...")]
    } else if state.can_submit() {
        &[("↑↓", "Field"), ("Ctrl+S", "Upload"), ("Tab", "Next tab"), ("Esc", "Back")]
    } else {
        &[("↑↓", "Field"), ("Tab", "Next tab"), ("Esc", "Back")]
    };
    render_footer(f, chunks[2], state.error_message.as_deref(), hints);
}

fn render_success(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("✓ Examination uploaded", ClinicTheme::success())),
        Line::from(Span::styled(
            "The file was uploaded and processed.",
            ClinicTheme::text_secondary(),
        )),
    ])
    .alignment(ratatui::layout::Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(ClinicTheme::border()),
    );
    f.render_widget(content, area);
}

fn file_line(state: &ExaminationState) -> Line<'static> {
    match (&state.selected_file, state.file_input.trim().is_empty()) {
        (Some(file), _) => {
            let marker = match file.kind {
                FileKind::Image => "[image]",
                FileKind::Document => "[document]",
            };
            let name = Path::new(state.file_input.trim())
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(format!("    {marker} "), ClinicTheme::info()),
                Span::styled(name, ClinicTheme::text()),
                Span::styled(format!("  {}", format_size_mb(file.size)), ClinicTheme::text_muted()),
            ])
        }
        (None, false) => Line::from(Span::styled(
            "    File not found",
            ClinicTheme::warning(),
        )),
        (None, true) => Line::from(""),
    }
}

fn render_upload_form(f: &mut Frame, area: Rect, state: &ExaminationState) {
    let mut lines = Vec::new();
    for (i, field) in ExamField::ALL.iter().enumerate() {
        let is_selected = i == state.selected_field;
        let label_style = if is_selected {
            ClinicTheme::focused()
        } else {
            ClinicTheme::text_secondary()
        };
        let value = match field {
            ExamField::Name => state.draft.examination_name.clone(),
            ExamField::File => state.file_input.clone(),
            ExamField::Text => state.draft.result_text.clone(),
        };
        let value_span = if value.is_empty() {
            Span::styled(field.hint(), ClinicTheme::text_muted())
        } else {
            Span::styled(value, ClinicTheme::text())
        };

        lines.push(Line::from(vec![
            Span::styled(if is_selected { "▶ " } else { "  " }, ClinicTheme::cursor()),
            Span::styled(format!("{}: ", field.label()), label_style),
        ]));
        lines.push(Line::from(vec![
            Span::raw("    "),
            value_span,
            if is_selected {
                Span::styled("▌", ClinicTheme::cursor())
            } else {
                Span::raw("")
            },
        ]));
        if *field == ExamField::File {
            lines.push(file_line(state));
        }
    }

    let form = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(" Upload examination ", ClinicTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(ClinicTheme::border()),
    );
    f.render_widget(form, area);
}

fn render_results(f: &mut Frame, area: Rect, state: &ExaminationState) {
    let mut lines = Vec::new();
    if state.loading_results && state.results.is_empty() {
        lines.push(Line::from(Span::styled(
            "Loading examinations...",
            ClinicTheme::text_secondary(),
        )));
    } else if let Some(err) = &state.results_error {
        lines.push(Line::from(Span::styled(
            format!("Failed to load examinations: {err}"),
            ClinicTheme::danger(),
        )));
    } else if state.results.is_empty() {
        lines.push(Line::from(Span::styled(
            "No examinations uploaded for this visit.",
            ClinicTheme::text_muted(),
        )));
    }

    for exam in &state.results {
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", exam.examination_name), ClinicTheme::title()),
            Span::styled(format_api_date(&exam.created_at), ClinicTheme::text_muted()),
        ]));
        if let Some(text) = &exam.result_text {
            lines.push(Line::from(Span::styled(
                format!("  {text}"),
                ClinicTheme::text_secondary(),
            )));
        }
    }

    let list = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(Span::styled(" Examinations ", ClinicTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(ClinicTheme::border()),
        );
    f.render_widget(list, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn type_into(state: &mut ExaminationState, field: ExamField, text: &str) {
        state.selected_field = ExamField::ALL
            .iter()
            .position(|f| *f == field)
            .expect("Known field");
        for c in text.chars() {
            state.input_char(c);
        }
    }

    #[test]
    fn test_submit_needs_name_and_existing_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".jpg")
            .tempfile()
            .expect("Temp file");
        file.write_all(&[0u8; 2048]).expect("Should write");
        let path = file.path().to_string_lossy().into_owned();

        let mut state = ExaminationState::default();
        type_into(&mut state, ExamField::File, "/definitely/missing.pdf");
        type_into(&mut state, ExamField::Name, "Chest X-ray");
        assert!(!state.can_submit());

        state.file_input.clear();
        type_into(&mut state, ExamField::File, &path);
        assert!(state.can_submit());
        let selected = state.selected_file.expect("File selected");
        assert_eq!(selected.kind, FileKind::Image);
        assert_eq!(selected.size, 2048);

        state.draft.examination_name.clear();
        assert!(!state.can_submit());
    }

    #[test]
    fn test_success_resets_after_display_time() {
        let mut state = ExaminationState::default();
        state.draft.examination_name = "ECG".into();
        state.draft.file = Some(PathBuf::from("/tmp/ecg.pdf"));
        state.file_input = "/tmp/ecg.pdf".into();

        let start = Instant::now();
        state.mark_uploaded(start);
        assert!(!state.can_submit());
        assert!(!state.tick(start + Duration::from_millis(1999)));
        assert_eq!(state.draft.examination_name, "ECG");

        assert!(state.tick(start + SUCCESS_DISPLAY));
        assert!(state.success_until.is_none());
        assert_eq!(state.draft, ExaminationDraft::default());
        assert!(state.file_input.is_empty());
    }
}
