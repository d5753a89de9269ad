//! Anamnesis (medical history) record attached to a visit.
//!
//! Every field is optional on the wire. The form works on a fully populated
//! record (`form_defaults`) and applies edits as partial patches through
//! [`Anamnesis::merge`], so an edit to one nested field never resets its
//! siblings.

use serde::{Deserialize, Serialize};

use super::Sex;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct General {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Genetic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_family_history: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Smoking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yes: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lifestyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoking: Option<Smoking>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alcohol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diet: Option<Vec<String>>,
}

/// Body of `POST /v1/clinical/visits/{id}/anamnesis` and of the matching GET.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Anamnesis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general: Option<General>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genetic: Option<Genetic>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifestyle: Option<Lifestyle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub past_conditions: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surgeries_traumas: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complaints: Option<Vec<String>>,
}

/// Response of the anamnesis upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnamnesisSaved {
    pub anamnesis_id: i64,
}

fn merge_value<T>(dst: &mut Option<T>, src: Option<T>) {
    if src.is_some() {
        *dst = src;
    }
}

fn merge_section<T: Merge>(dst: &mut Option<T>, src: Option<T>) {
    match (dst.as_mut(), src) {
        (Some(current), Some(patch)) => current.merge(patch),
        (None, Some(patch)) => *dst = Some(patch),
        (_, None) => {}
    }
}

/// Field-wise overlay of a partial record.
pub trait Merge {
    fn merge(&mut self, patch: Self);
}

impl Merge for General {
    fn merge(&mut self, patch: Self) {
        merge_value(&mut self.age, patch.age);
        merge_value(&mut self.sex, patch.sex);
    }
}

impl Merge for Genetic {
    fn merge(&mut self, patch: Self) {
        merge_value(&mut self.has_family_history, patch.has_family_history);
        merge_value(&mut self.details, patch.details);
    }
}

impl Merge for Smoking {
    fn merge(&mut self, patch: Self) {
        merge_value(&mut self.yes, patch.yes);
        merge_value(&mut self.years, patch.years);
    }
}

impl Merge for Lifestyle {
    fn merge(&mut self, patch: Self) {
        merge_section(&mut self.smoking, patch.smoking);
        merge_value(&mut self.alcohol, patch.alcohol);
        merge_value(&mut self.activity, patch.activity);
        merge_value(&mut self.diet, patch.diet);
    }
}

impl Merge for Anamnesis {
    fn merge(&mut self, patch: Self) {
        merge_section(&mut self.general, patch.general);
        merge_section(&mut self.genetic, patch.genetic);
        merge_section(&mut self.lifestyle, patch.lifestyle);
        merge_value(&mut self.past_conditions, patch.past_conditions);
        merge_value(&mut self.surgeries_traumas, patch.surgeries_traumas);
        merge_value(&mut self.medications, patch.medications);
        merge_value(&mut self.allergies, patch.allergies);
        merge_value(&mut self.complaints, patch.complaints);
    }
}

impl Anamnesis {
    /// Blank record the form starts from when the visit has none yet.
    #[must_use]
    pub fn form_defaults() -> Self {
        Self {
            general: Some(General::default()),
            genetic: Some(Genetic {
                has_family_history: Some(false),
                details: Some(String::new()),
            }),
            lifestyle: Some(Lifestyle {
                smoking: Some(Smoking {
                    yes: Some(false),
                    years: None,
                }),
                alcohol: Some(String::new()),
                activity: Some(String::new()),
                diet: Some(Vec::new()),
            }),
            past_conditions: Some(Vec::new()),
            surgeries_traumas: Some(Vec::new()),
            medications: Some(Vec::new()),
            allergies: Some(Vec::new()),
            complaints: Some(Vec::new()),
        }
    }

    /// Record loaded from the server layered over the form defaults, so that
    /// sections the server omitted still have editable values.
    #[must_use]
    pub fn with_form_defaults(self) -> Self {
        let mut base = Self::form_defaults();
        base.merge(self);
        base
    }

    #[must_use]
    pub fn smokes(&self) -> bool {
        self.lifestyle
            .as_ref()
            .and_then(|l| l.smoking.as_ref())
            .and_then(|s| s.yes)
            .unwrap_or(false)
    }

    #[must_use]
    pub fn has_family_history(&self) -> bool {
        self.genetic
            .as_ref()
            .and_then(|g| g.has_family_history)
            .unwrap_or(false)
    }

    /// Items of a list field (empty when unset).
    #[must_use]
    pub fn items(&self, list: AnamnesisList) -> &[String] {
        let slot = match list {
            AnamnesisList::PastConditions => &self.past_conditions,
            AnamnesisList::SurgeriesTraumas => &self.surgeries_traumas,
            AnamnesisList::Medications => &self.medications,
            AnamnesisList::Allergies => &self.allergies,
            AnamnesisList::Complaints => &self.complaints,
        };
        slot.as_deref().unwrap_or(&[])
    }

    fn items_mut(&mut self, list: AnamnesisList) -> &mut Vec<String> {
        let slot = match list {
            AnamnesisList::PastConditions => &mut self.past_conditions,
            AnamnesisList::SurgeriesTraumas => &mut self.surgeries_traumas,
            AnamnesisList::Medications => &mut self.medications,
            AnamnesisList::Allergies => &mut self.allergies,
            AnamnesisList::Complaints => &mut self.complaints,
        };
        slot.get_or_insert_with(Vec::new)
    }

    /// Append a trimmed item. Blank input is ignored and returns `false`.
    pub fn push_item(&mut self, list: AnamnesisList, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        self.items_mut(list).push(value.to_string());
        true
    }

    /// Remove the item at `index`; out-of-range indexes are ignored.
    pub fn remove_item(&mut self, list: AnamnesisList, index: usize) -> Option<String> {
        let items = self.items_mut(list);
        (index < items.len()).then(|| items.remove(index))
    }
}

/// The free-form list sections of the anamnesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnamnesisList {
    PastConditions,
    SurgeriesTraumas,
    Medications,
    Allergies,
    Complaints,
}

impl AnamnesisList {
    pub const ALL: [AnamnesisList; 5] = [
        AnamnesisList::PastConditions,
        AnamnesisList::SurgeriesTraumas,
        AnamnesisList::Medications,
        AnamnesisList::Allergies,
        AnamnesisList::Complaints,
    ];

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::PastConditions => "Past conditions",
            Self::SurgeriesTraumas => "Surgeries and traumas",
            Self::Medications => "Current medications",
            Self::Allergies => "Allergies",
            Self::Complaints => "Complaints",
        }
    }

    #[must_use]
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::PastConditions => "Enter a condition",
            Self::SurgeriesTraumas => "Enter a surgery or trauma",
            Self::Medications => "Enter a medication",
            Self::Allergies => "Enter an allergen",
            Self::Complaints => "Enter a complaint",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_untouched_nested_defaults() {
        let mut form = Anamnesis::form_defaults();
        form.merge(Anamnesis {
            lifestyle: Some(Lifestyle {
                smoking: Some(Smoking {
                    years: Some(15),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });

        let lifestyle = form.lifestyle.as_ref().unwrap();
        let smoking = lifestyle.smoking.as_ref().unwrap();
        assert_eq!(smoking.years, Some(15));
        assert_eq!(smoking.yes, Some(false));
        assert_eq!(lifestyle.alcohol.as_deref(), Some(""));
        assert_eq!(lifestyle.diet.as_deref(), Some(&[][..]));
        assert_eq!(form.genetic.as_ref().unwrap().has_family_history, Some(false));
    }

    #[test]
    fn test_merge_sibling_fields_survive() {
        let mut form = Anamnesis::form_defaults();
        form.merge(Anamnesis {
            general: Some(General {
                sex: Some(Sex::Female),
                ..Default::default()
            }),
            ..Default::default()
        });
        form.merge(Anamnesis {
            general: Some(General {
                age: Some(32),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(
            form.general,
            Some(General {
                age: Some(32),
                sex: Some(Sex::Female)
            })
        );
    }

    #[test]
    fn test_server_record_layered_over_defaults() {
        let loaded: Anamnesis =
            serde_json::from_str(r#"{"complaints":["Headache"]}"#).unwrap();
        let form = loaded.with_form_defaults();
        assert_eq!(form.items(AnamnesisList::Complaints), ["Headache".to_string()]);
        assert!(!form.smokes());
        assert!(form.lifestyle.is_some());
    }

    #[test]
    fn test_push_item_trims_and_skips_blank() {
        let mut a = Anamnesis::default();
        assert!(!a.push_item(AnamnesisList::Allergies, "   "));
        assert!(a.push_item(AnamnesisList::Allergies, "  penicillin "));
        assert_eq!(a.items(AnamnesisList::Allergies), ["penicillin".to_string()]);
    }

    #[test]
    fn test_remove_item_out_of_range() {
        let mut a = Anamnesis::form_defaults();
        a.push_item(AnamnesisList::Medications, "Lisinopril");
        assert_eq!(a.remove_item(AnamnesisList::Medications, 3), None);
        assert_eq!(
            a.remove_item(AnamnesisList::Medications, 0).as_deref(),
            Some("Lisinopril")
        );
        assert!(a.items(AnamnesisList::Medications).is_empty());
    }

    #[test]
    fn test_unset_sections_not_serialized() {
        let a = Anamnesis {
            complaints: Some(vec!["Cough".into()]),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            serde_json::json!({ "complaints": ["Cough"] })
        );
    }
}
