//! Extraction result models.
//!
//! An `ExtractionResult` is produced once per distinct (content, metadata)
//! pair and is never mutated afterwards; repeat requests are served from
//! the content cache.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse document classification derived from keywords in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[default]
    Unknown,
    Academic,
    Form,
    Certificate,
    Administrative,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Academic => "academic",
            Self::Form => "form",
            Self::Certificate => "certificate",
            Self::Administrative => "administrative",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unknown" => Some(Self::Unknown),
            "academic" => Some(Self::Academic),
            "form" => Some(Self::Form),
            "certificate" => Some(Self::Certificate),
            "administrative" => Some(Self::Administrative),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heuristic quality signals for a block of recognized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextQuality {
    pub is_searchable: bool,
    pub is_high_quality: bool,
    /// Penalized recognizer confidence, 0-100.
    pub estimated_accuracy: f64,
    pub word_count: usize,
    pub character_count: usize,
    pub has_meaningful_content: bool,
    pub document_type: DocumentType,
}

/// Text, confidence and derived signals for one recognized document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub text: String,
    /// Recognizer confidence, 0-100.
    pub confidence: f64,
    pub quality: TextQuality,
    /// Keyword fields found in the text (`nis`, `kelas`, `date`, ...).
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// Caller-supplied context for a document.
///
/// Every field participates in the cache key, so two uploads of the same
/// bytes by different users are cached separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl DocumentMetadata {
    pub fn with_document_id(mut self, id: impl Into<String>) -> Self {
        self.document_id = Some(id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>, role: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.user_role = Some(role.into());
        self
    }
}
