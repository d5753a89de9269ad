//! Anamnesis form over the nested medical history record.
//!
//! Scalar edits are applied to the record as partial patches through
//! [`Merge`], so touching one nested field leaves its siblings intact.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::{
    sex_label, Anamnesis, AnamnesisList, General, Genetic, Lifestyle, Merge, Sex, Smoking,
};
use crate::tui::styles::ClinicTheme;

use super::render_footer;

const MAX_AGE: u32 = 150;
const MAX_TEXT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnamnesisField {
    Age,
    Sex,
    FamilyHistory,
    FamilyDetails,
    Smoking,
    SmokingYears,
    Alcohol,
    Activity,
    List(AnamnesisList),
}

impl AnamnesisField {
    pub const ALL: [AnamnesisField; 13] = [
        Self::Age,
        Self::Sex,
        Self::FamilyHistory,
        Self::FamilyDetails,
        Self::Smoking,
        Self::SmokingYears,
        Self::Alcohol,
        Self::Activity,
        Self::List(AnamnesisList::PastConditions),
        Self::List(AnamnesisList::SurgeriesTraumas),
        Self::List(AnamnesisList::Medications),
        Self::List(AnamnesisList::Allergies),
        Self::List(AnamnesisList::Complaints),
    ];

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::Sex => "Sex",
            Self::FamilyHistory => "Family history of disease",
            Self::FamilyDetails => "Details",
            Self::Smoking => "Smoking",
            Self::SmokingYears => "Years of smoking",
            Self::Alcohol => "Alcohol",
            Self::Activity => "Physical activity",
            Self::List(list) => list.label(),
        }
    }

    /// Section heading printed above the first field of each group.
    fn section(&self) -> Option<&'static str> {
        match self {
            Self::Age => Some("General"),
            Self::FamilyHistory => Some("Genetic history"),
            Self::Smoking => Some("Lifestyle"),
            Self::List(AnamnesisList::PastConditions) => Some("Medical history"),
            _ => None,
        }
    }
}

fn patch_general(general: General) -> Anamnesis {
    Anamnesis {
        general: Some(general),
        ..Default::default()
    }
}

fn patch_genetic(genetic: Genetic) -> Anamnesis {
    Anamnesis {
        genetic: Some(genetic),
        ..Default::default()
    }
}

fn patch_lifestyle(lifestyle: Lifestyle) -> Anamnesis {
    Anamnesis {
        lifestyle: Some(lifestyle),
        ..Default::default()
    }
}

fn patch_smoking(smoking: Smoking) -> Anamnesis {
    patch_lifestyle(Lifestyle {
        smoking: Some(smoking),
        ..Default::default()
    })
}

fn push_digit(current: Option<u32>, digit: u32, max: u32) -> Option<u32> {
    let next = current.unwrap_or(0).saturating_mul(10).saturating_add(digit);
    Some(next.min(max))
}

/// Anamnesis tab state
#[derive(Debug)]
pub struct AnamnesisFormState {
    pub record: Anamnesis,
    pub selected_field: usize,
    /// Pending entry of the selected list field.
    pub input: String,
    pub loading: bool,
    pub saving: bool,
    pub error_message: Option<String>,
}

impl Default for AnamnesisFormState {
    fn default() -> Self {
        Self {
            record: Anamnesis::form_defaults(),
            selected_field: 0,
            input: String::new(),
            loading: false,
            saving: false,
            error_message: None,
        }
    }
}

impl AnamnesisFormState {
    /// Show a record loaded from the server, or a blank form.
    pub fn load(&mut self, anamnesis: Option<Anamnesis>) {
        self.record = anamnesis.map_or_else(Anamnesis::form_defaults, Anamnesis::with_form_defaults);
        self.loading = false;
    }

    #[must_use]
    pub fn field(&self) -> AnamnesisField {
        AnamnesisField::ALL[self.selected_field]
    }

    pub fn next_field(&mut self) {
        self.input.clear();
        self.selected_field = (self.selected_field + 1) % AnamnesisField::ALL.len();
    }

    pub fn prev_field(&mut self) {
        self.input.clear();
        if self.selected_field == 0 {
            self.selected_field = AnamnesisField::ALL.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    fn general(&self) -> General {
        self.record.general.clone().unwrap_or_default()
    }

    fn genetic(&self) -> Genetic {
        self.record.genetic.clone().unwrap_or_default()
    }

    fn lifestyle(&self) -> Lifestyle {
        self.record.lifestyle.clone().unwrap_or_default()
    }

    fn smoking(&self) -> Smoking {
        self.lifestyle().smoking.unwrap_or_default()
    }

    fn append_text(current: Option<String>, c: char) -> Option<String> {
        let mut text = current.unwrap_or_default();
        if text.chars().count() < MAX_TEXT {
            text.push(c);
        }
        Some(text)
    }

    /// Type a character into the selected field.
    pub fn input_char(&mut self, c: char) {
        let patch = match self.field() {
            AnamnesisField::Age => match c.to_digit(10) {
                Some(d) => patch_general(General {
                    age: push_digit(self.general().age, d, MAX_AGE),
                    sex: None,
                }),
                None => return,
            },
            AnamnesisField::SmokingYears => match c.to_digit(10) {
                Some(d) => patch_smoking(Smoking {
                    yes: None,
                    years: push_digit(self.smoking().years, d, MAX_AGE),
                }),
                None => return,
            },
            AnamnesisField::Sex | AnamnesisField::FamilyHistory | AnamnesisField::Smoking => {
                if c == ' ' {
                    self.toggle();
                }
                return;
            }
            AnamnesisField::FamilyDetails => patch_genetic(Genetic {
                has_family_history: None,
                details: Self::append_text(self.genetic().details, c),
            }),
            AnamnesisField::Alcohol => patch_lifestyle(Lifestyle {
                alcohol: Self::append_text(self.lifestyle().alcohol, c),
                ..Default::default()
            }),
            AnamnesisField::Activity => patch_lifestyle(Lifestyle {
                activity: Self::append_text(self.lifestyle().activity, c),
                ..Default::default()
            }),
            AnamnesisField::List(_) => {
                if self.input.chars().count() < MAX_TEXT {
                    self.input.push(c);
                }
                return;
            }
        };
        self.record.merge(patch);
        self.error_message = None;
    }

    /// Flip a yes/no field or cycle the sex selector.
    pub fn toggle(&mut self) {
        // Cycling past `Other` clears the sex, which a patch cannot express.
        if self.field() == AnamnesisField::Sex && self.general().sex == Some(Sex::Other) {
            self.record.general.get_or_insert_with(General::default).sex = None;
            return;
        }

        let patch = match self.field() {
            AnamnesisField::Sex => patch_general(General {
                age: None,
                sex: Sex::cycle(self.general().sex),
            }),
            AnamnesisField::FamilyHistory => patch_genetic(Genetic {
                has_family_history: Some(!self.record.has_family_history()),
                details: None,
            }),
            AnamnesisField::Smoking => patch_smoking(Smoking {
                yes: Some(!self.record.smokes()),
                years: None,
            }),
            _ => return,
        };
        self.record.merge(patch);
    }

    /// Remove the last character of the selected field.
    pub fn backspace(&mut self) {
        match self.field() {
            AnamnesisField::Age => {
                let general = self.record.general.get_or_insert_with(General::default);
                general.age = general.age.map(|a| a / 10).filter(|&a| a > 0);
            }
            AnamnesisField::SmokingYears => {
                let smoking = self
                    .record
                    .lifestyle
                    .get_or_insert_with(Lifestyle::default)
                    .smoking
                    .get_or_insert_with(Smoking::default);
                smoking.years = smoking.years.map(|y| y / 10).filter(|&y| y > 0);
            }
            AnamnesisField::FamilyDetails => {
                if let Some(details) = self
                    .record
                    .genetic
                    .as_mut()
                    .and_then(|g| g.details.as_mut())
                {
                    details.pop();
                }
            }
            AnamnesisField::Alcohol => {
                if let Some(text) = self
                    .record
                    .lifestyle
                    .as_mut()
                    .and_then(|l| l.alcohol.as_mut())
                {
                    text.pop();
                }
            }
            AnamnesisField::Activity => {
                if let Some(text) = self
                    .record
                    .lifestyle
                    .as_mut()
                    .and_then(|l| l.activity.as_mut())
                {
                    text.pop();
                }
            }
            AnamnesisField::List(_) => {
                self.input.pop();
            }
            AnamnesisField::Sex | AnamnesisField::FamilyHistory | AnamnesisField::Smoking => {}
        }
    }

    /// Enter: append the pending list item, or move on from a scalar field.
    pub fn enter(&mut self) {
        match self.field() {
            AnamnesisField::List(list) => {
                if self.record.push_item(list, &self.input) {
                    self.input.clear();
                }
            }
            _ => self.next_field(),
        }
    }

    /// Delete: drop the last item of the selected list field.
    pub fn remove_last(&mut self) {
        if let AnamnesisField::List(list) = self.field() {
            let len = self.record.items(list).len();
            if len > 0 {
                self.record.remove_item(list, len - 1);
            }
        }
    }

    fn value_text(&self, field: AnamnesisField) -> String {
        let yes_no = |v: bool| if v { "[x] yes" } else { "[ ] no" }.to_string();
        match field {
            AnamnesisField::Age => self
                .general()
                .age
                .map(|a| a.to_string())
                .unwrap_or_default(),
            AnamnesisField::Sex => sex_label(self.general().sex).to_string(),
            AnamnesisField::FamilyHistory => yes_no(self.record.has_family_history()),
            AnamnesisField::FamilyDetails => self.genetic().details.unwrap_or_default(),
            AnamnesisField::Smoking => yes_no(self.record.smokes()),
            AnamnesisField::SmokingYears => self
                .smoking()
                .years
                .map(|y| y.to_string())
                .unwrap_or_default(),
            AnamnesisField::Alcohol => self.lifestyle().alcohol.unwrap_or_default(),
            AnamnesisField::Activity => self.lifestyle().activity.unwrap_or_default(),
            AnamnesisField::List(list) => self.record.items(list).join("; "),
        }
    }

    /// Whether a field is shown; details and years only follow a "yes".
    fn visible(&self, field: AnamnesisField) -> bool {
        match field {
            AnamnesisField::FamilyDetails => self.record.has_family_history(),
            AnamnesisField::SmokingYears => self.record.smokes(),
            _ => true,
        }
    }
}

/// Render the anamnesis tab
pub fn render_anamnesis(f: &mut Frame, area: Rect, state: &AnamnesisFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(area);

    let block = Block::default()
        .title(Span::styled(" Patient anamnesis ", ClinicTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(ClinicTheme::border());

    if state.loading {
        let p = Paragraph::new(Line::from(Span::styled(
            " Loading anamnesis...",
            ClinicTheme::text_secondary(),
        )))
        .block(block);
        f.render_widget(p, chunks[0]);
        return;
    }

    let mut lines = Vec::new();
    let mut selected_line = 0usize;
    for (i, field) in AnamnesisField::ALL.iter().enumerate() {
        if let Some(section) = field.section() {
            if !lines.is_empty() {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(section, ClinicTheme::subtitle())));
        }
        let is_selected = i == state.selected_field;
        if !state.visible(*field) && !is_selected {
            continue;
        }
        if is_selected {
            selected_line = lines.len();
        }

        let label_style = if is_selected {
            ClinicTheme::focused()
        } else {
            ClinicTheme::text_secondary()
        };
        let value = state.value_text(*field);
        let value_span = if value.is_empty() {
            Span::styled("-", ClinicTheme::text_muted())
        } else {
            Span::styled(value, ClinicTheme::text())
        };
        let marker = if is_selected { "▶ " } else { "  " };
        lines.push(Line::from(vec![
            Span::styled(marker, ClinicTheme::cursor()),
            Span::styled(format!("{}: ", field.label()), label_style),
            value_span,
        ]));

        if let (true, AnamnesisField::List(list)) = (is_selected, field) {
            let pending = if state.input.is_empty() {
                Span::styled(list.placeholder(), ClinicTheme::text_muted())
            } else {
                Span::styled(state.input.clone(), ClinicTheme::text())
            };
            lines.push(Line::from(vec![
                Span::styled("    + ", ClinicTheme::key_hint()),
                pending,
                Span::styled("▌", ClinicTheme::cursor()),
            ]));
        }
    }

    let inner_height = chunks[0].height.saturating_sub(2) as usize;
    let scroll = (selected_line + 2).saturating_sub(inner_height);
    let form = Paragraph::new(lines)
        .block(block)
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));
    f.render_widget(form, chunks[0]);

    let hints: &[(&str, &str)] = if state.saving {
        &[("", "Saving anamnesis...")]
    } else {
        match state.field() {
            AnamnesisField::List(_) => &[
                ("Enter", "Add"),
                ("Del", "Remove last"),
                ("↑↓", "Field"),
                ("Ctrl+S", "Save"),
                ("Tab", "Next tab"),
                ("Esc", "Back"),
            ],
            AnamnesisField::Sex | AnamnesisField::FamilyHistory | AnamnesisField::Smoking => &[
                ("Space", "Toggle"),
                ("↑↓", "Field"),
                ("Ctrl+S", "Save"),
                ("Tab", "Next tab"),
                ("Esc", "Back"),
            ],
            _ => &[
                ("↑↓", "Field"),
                ("Ctrl+S", "Save"),
                ("Tab", "Next tab"),
                ("Esc", "Back"),
            ],
        }
    };
    render_footer(f, chunks[1], state.error_message.as_deref(), hints);
}
