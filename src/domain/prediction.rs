//! AI diagnostic suggestions returned by `POST /v1/clinical/visits/{id}/predict`.

use serde::{Deserialize, Serialize};

/// Probability band used to colour a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbabilityBand {
    /// Below 40%
    Low,
    /// 40% up to 70%
    Elevated,
    /// 70% and above
    High,
}

impl ProbabilityBand {
    #[must_use]
    pub fn of(probability: f64) -> Self {
        if probability >= 0.7 {
            Self::High
        } else if probability >= 0.4 {
            Self::Elevated
        } else {
            Self::Low
        }
    }

    /// Marker printed in front of the percentage.
    #[must_use]
    pub fn marker(&self) -> &'static str {
        match self {
            Self::High => "!!",
            Self::Elevated => "!",
            Self::Low => "~",
        }
    }
}

impl std::fmt::Display for ProbabilityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Elevated => write!(f, "ELEVATED"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisSuggestion {
    pub disease_name: String,

    /// 0.0 to 1.0
    pub probability: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl DiagnosisSuggestion {
    #[must_use]
    pub fn band(&self) -> ProbabilityBand {
        ProbabilityBand::of(self.probability)
    }

    /// Percentage with one decimal, e.g. `85.0%`.
    #[must_use]
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.probability * 100.0)
    }

    /// Probability clamped to a gauge percentage.
    #[must_use]
    pub fn gauge_percent(&self) -> u16 {
        (self.probability.clamp(0.0, 1.0) * 100.0).round() as u16
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralSuggestion {
    pub specialty: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Prediction for a visit. Lists keep the order chosen by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    #[serde(default)]
    pub suggestions: Vec<DiagnosisSuggestion>,

    #[serde(default)]
    pub referrals: Vec<ReferralSuggestion>,
}

impl Predictions {
    /// No suggestions and no referrals: not enough data for a prediction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty() && self.referrals.is_empty()
    }
}
