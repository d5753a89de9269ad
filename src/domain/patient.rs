//! Patient records as exposed by the clinical API.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Administrative sex as recorded by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    /// All values in the order they are offered in selectors.
    pub const ALL: [Sex; 3] = [Sex::Male, Sex::Female, Sex::Other];

    /// Single-letter marker used in list rows. `Other` has no marker.
    #[must_use]
    pub fn short_label(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Other => "",
        }
    }

    /// Full label for detail views.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }

    /// Cycle to the next value; `None` wraps to `Male` and `Other` wraps to `None`.
    #[must_use]
    pub fn cycle(current: Option<Sex>) -> Option<Sex> {
        match current {
            None => Some(Self::Male),
            Some(Self::Male) => Some(Self::Female),
            Some(Self::Female) => Some(Self::Other),
            Some(Self::Other) => None,
        }
    }
}

/// Label for an optional sex, "Not specified" when absent.
#[must_use]
pub fn sex_label(sex: Option<Sex>) -> &'static str {
    sex.map_or("Not specified", |s| s.label())
}

/// Payload for `POST /v1/clinical/patients`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientCreate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
}

/// Patient as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,

    /// Server timestamp, kept verbatim (RFC 3339).
    pub created_at: String,
}

impl Patient {
    /// Age in years: the recorded age wins, otherwise the difference between
    /// the birth year and `today`'s year.
    #[must_use]
    pub fn age_years(&self, today: NaiveDate) -> Option<i32> {
        self.recorded_age
            .filter(|&age| age > 0)
            .and_then(|age| i32::try_from(age).ok())
            .or_else(|| self.date_of_birth.map(|dob| today.year() - dob.year()))
    }

    /// Human-readable age for list rows and the detail header.
    #[must_use]
    pub fn age_label(&self, today: NaiveDate) -> String {
        match self.age_years(today) {
            Some(years) => format!("{years} y.o."),
            None => "Age not specified".to_string(),
        }
    }

    /// Registration date as `dd.mm.yyyy`, or the raw value when unparseable.
    #[must_use]
    pub fn registered_on(&self) -> String {
        format_api_date(&self.created_at)
    }
}

/// Format an API timestamp as `dd.mm.yyyy`.
///
/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates; anything else is
/// returned unchanged.
#[must_use]
pub fn format_api_date(raw: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.format("%d.%m.%Y").to_string();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%d.%m.%Y").to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.format("%d.%m.%Y").to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(recorded_age: Option<u32>, dob: Option<&str>) -> Patient {
        Patient {
            id: 1,
            date_of_birth: dob.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            recorded_age,
            sex: Some(Sex::Male),
            created_at: "2024-01-15T10:30:00Z".to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_recorded_age_wins() {
        let p = patient(Some(39), Some("1970-01-01"));
        assert_eq!(p.age_label(today()), "39 y.o.");
    }

    #[test]
    fn test_age_from_birth_year() {
        let p = patient(None, Some("1985-03-15"));
        assert_eq!(p.age_years(today()), Some(41));
    }

    #[test]
    fn test_zero_recorded_age_falls_back_to_birth_date() {
        let p = patient(Some(0), Some("2000-12-31"));
        assert_eq!(p.age_years(today()), Some(26));
    }

    #[test]
    fn test_out_of_range_recorded_age_is_ignored() {
        let p = patient(Some(u32::MAX), Some("1985-03-15"));
        assert_eq!(p.age_years(today()), Some(41));

        let p = patient(Some(u32::MAX), None);
        assert_eq!(p.age_years(today()), None);
    }

    #[test]
    fn test_age_unknown() {
        let p = patient(None, None);
        assert_eq!(p.age_label(today()), "Age not specified");
    }

    #[test]
    fn test_sex_wire_format() {
        let json = serde_json::to_string(&Sex::Female).unwrap();
        assert_eq!(json, "\"female\"");
        assert_eq!(Sex::Other.short_label(), "");
    }

    #[test]
    fn test_create_payload_omits_unset_fields() {
        let body = PatientCreate {
            recorded_age: Some(40),
            ..Default::default()
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "recorded_age": 40 }));
    }

    #[test]
    fn test_sex_cycle_passes_through_none() {
        assert_eq!(Sex::cycle(None), Some(Sex::Male));
        assert_eq!(Sex::cycle(Some(Sex::Other)), None);
    }

    #[test]
    fn test_format_api_date() {
        assert_eq!(format_api_date("2024-01-15T10:30:00Z"), "15.01.2024");
        assert_eq!(format_api_date("2024-01-15T10:30:00.123456"), "15.01.2024");
        assert_eq!(format_api_date("2024-01-15"), "15.01.2024");
        assert_eq!(format_api_date("yesterday"), "yesterday");
    }
}
