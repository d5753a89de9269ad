//! New patient registration form.

use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{PatientCreate, Sex};
use crate::tui::styles::ClinicTheme;

use super::render_footer;

/// Upper bound accepted for a recorded age.
const MAX_AGE: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientField {
    DateOfBirth,
    Age,
    Sex,
}

impl PatientField {
    pub const ALL: [PatientField; 3] = [Self::DateOfBirth, Self::Age, Self::Sex];

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::DateOfBirth => "Date of birth",
            Self::Age => "Age",
            Self::Sex => "Sex",
        }
    }

    #[must_use]
    pub fn hint(&self) -> &'static str {
        match self {
            Self::DateOfBirth => "YYYY-MM-DD",
            Self::Age => "Enter age",
            Self::Sex => "Space to choose",
        }
    }
}

/// Patient form state
#[derive(Debug, Default)]
pub struct PatientFormState {
    pub date_of_birth: String,
    pub age: String,
    pub sex: Option<Sex>,
    pub selected_field: usize,
    pub submitting: bool,
    pub error_message: Option<String>,
}

impl PatientFormState {
    #[must_use]
    pub fn field(&self) -> PatientField {
        PatientField::ALL[self.selected_field]
    }

    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % PatientField::ALL.len();
    }

    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = PatientField::ALL.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field
    pub fn input_char(&mut self, c: char) {
        match self.field() {
            PatientField::DateOfBirth if c.is_ascii_digit() || c == '-' => {
                if self.date_of_birth.len() < 10 {
                    self.date_of_birth.push(c);
                }
            }
            PatientField::Age if c.is_ascii_digit() => {
                if self.age.len() < 3 {
                    self.age.push(c);
                }
            }
            PatientField::Sex if c == ' ' => self.cycle_sex(),
            _ => return,
        }
        self.error_message = None;
    }

    pub fn delete_char(&mut self) {
        match self.field() {
            PatientField::DateOfBirth => {
                self.date_of_birth.pop();
            }
            PatientField::Age => {
                self.age.pop();
            }
            PatientField::Sex => self.sex = None,
        }
    }

    pub fn cycle_sex(&mut self) {
        self.sex = Sex::cycle(self.sex);
    }

    /// Wipe the typed values from memory and reset the form.
    pub fn clear_sensitive(&mut self) {
        self.date_of_birth.zeroize();
        self.age.zeroize();
        self.sex = None;
        self.selected_field = 0;
        self.error_message = None;
        self.submitting = false;
    }

    /// Validate and convert to the create payload. Every field is optional.
    ///
    /// # Errors
    /// Returns a message naming the invalid field.
    pub fn to_patient_create(&self) -> Result<PatientCreate, String> {
        let dob = self.date_of_birth.trim();
        let date_of_birth = if dob.is_empty() {
            None
        } else {
            Some(
                NaiveDate::parse_from_str(dob, "%Y-%m-%d")
                    .map_err(|_| "Date of birth: expected YYYY-MM-DD".to_string())?,
            )
        };

        let age = self.age.trim();
        let recorded_age = if age.is_empty() {
            None
        } else {
            let value: u32 = age
                .parse()
                .map_err(|_| "Age: Invalid number".to_string())?;
            if value > MAX_AGE {
                return Err(format!("Age: Value must be between 0 and {MAX_AGE}"));
            }
            Some(value)
        };

        Ok(PatientCreate {
            date_of_birth,
            recorded_age,
            sex: self.sex,
        })
    }
}

/// Render the patient registration form
pub fn render_patient_form(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(2), // Footer/error
        ])
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" New patient", ClinicTheme::title()),
        Span::styled(" │ all fields optional", ClinicTheme::text_secondary()),
    ]));
    f.render_widget(header, chunks[0]);

    render_form_fields(f, chunks[1], state);

    let hints: &[(&str, &str)] = if state.submitting {
        &[("", "Registering patient...")]
    } else {
        &[
            ("↑↓", "Navigate"),
            ("Space", "Choose sex"),
            ("Enter", "Register"),
            ("Esc", "Cancel"),
        ]
    };
    render_footer(f, chunks[2], state.error_message.as_deref(), hints);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let constraints: Vec<Constraint> = PatientField::ALL
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .horizontal_margin(1)
        .split(area);

    for (i, field) in PatientField::ALL.iter().enumerate() {
        let is_selected = i == state.selected_field;
        let (border_style, title_style) = if is_selected {
            (ClinicTheme::border_focused(), ClinicTheme::focused())
        } else {
            (ClinicTheme::border(), ClinicTheme::text_secondary())
        };

        let value = match field {
            PatientField::DateOfBirth => state.date_of_birth.clone(),
            PatientField::Age => state.age.clone(),
            PatientField::Sex => state.sex.map(|s| s.label().to_string()).unwrap_or_default(),
        };
        let value_display = if value.is_empty() {
            Span::styled(field.hint(), ClinicTheme::text_muted())
        } else {
            Span::styled(value, ClinicTheme::text())
        };

        let content = Paragraph::new(Line::from(vec![
            Span::raw(" "),
            value_display,
            if is_selected {
                Span::styled("▌", ClinicTheme::cursor())
            } else {
                Span::raw("")
            },
        ]))
        .block(
            Block::default()
                .title(Span::styled(format!(" {} ", field.label()), title_style))
                .borders(Borders::ALL)
                .border_style(border_style),
        );

        f.render_widget(content, chunks[i]);
    }
}
