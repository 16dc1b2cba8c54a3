//! Validation severities and the review events emitted for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome class of a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Failure,
    Warning,
    Success,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Failure => "failure",
            Self::Warning => "warning",
            Self::Success => "success",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "failure" => Some(Self::Failure),
            "warning" => Some(Self::Warning),
            "success" => Some(Self::Success),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A low-confidence or low-quality extraction that needs human review.
///
/// The JSON shape is the contract with the notification consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationEvent {
    /// Derived from `(severity, document_id)`; not unique across the log.
    pub id: String,
    pub severity: Severity,
    pub document_id: String,
    pub document_type: String,
    pub confidence: f64,
    pub issues: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub user_role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

impl ValidationEvent {
    pub fn event_id(severity: Severity, document_id: &str) -> String {
        format!("{}-{}", severity.as_str(), document_id)
    }
}
