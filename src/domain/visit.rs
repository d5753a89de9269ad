//! Visit records and list queries.

use serde::{Deserialize, Serialize};

/// Payload for `POST /v1/clinical/visits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitCreate {
    pub patient_id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
}

/// Response of `POST /v1/clinical/visits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitCreated {
    pub visit_id: i64,
}

/// Visit as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: i64,
    pub patient_id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,

    pub status: String,
    pub created_at: String,
}

impl Visit {
    #[must_use]
    pub fn status_kind(&self) -> VisitStatus {
        VisitStatus::classify(&self.status)
    }
}

/// Coarse classification of the free-form status string, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitStatus {
    Completed,
    InProgress,
    Pending,
    Other,
}

impl VisitStatus {
    #[must_use]
    pub fn classify(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "completed" => Self::Completed,
            "in_progress" => Self::InProgress,
            "pending" => Self::Pending,
            _ => Self::Other,
        }
    }
}

/// Filters for `GET /v1/clinical/visits`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisitQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub patient_id: Option<i64>,
}

impl VisitQuery {
    /// Query used by the list screens.
    #[must_use]
    pub fn recent(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Latest `limit` visits of one patient.
    #[must_use]
    pub fn for_patient(patient_id: i64, limit: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: None,
            patient_id: Some(patient_id),
        }
    }

    /// Key/value pairs for the query string.
    ///
    /// Unset and zero values are left out, in the order limit, offset, patient_id.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(limit) = self.limit.filter(|&v| v != 0) {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset.filter(|&v| v != 0) {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(patient_id) = self.patient_id.filter(|&v| v != 0) {
            pairs.push(("patient_id", patient_id.to_string()));
        }
        pairs
    }
}
