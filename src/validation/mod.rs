//! Threshold-based validation of extractions and attendance sheets.

mod sheet;

pub use sheet::{SheetValidation, SheetValidator};

use serde::Serialize;

use crate::config::ValidationConfig;
use crate::models::{DocumentType, ExtractionResult, Severity};

/// Issues found in one extraction and the severity they resolve to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionValidation {
    pub severity: Severity,
    pub issues: Vec<String>,
}

impl ExtractionValidation {
    /// Only extractions with issues are worth an event.
    pub fn needs_review(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Per-extraction validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionValidator {
    thresholds: ValidationConfig,
}

impl ExtractionValidator {
    pub fn new(thresholds: ValidationConfig) -> Self {
        Self { thresholds }
    }

    /// Check every rule. Issues are additive; severity takes the worst class.
    pub fn validate(&self, result: &ExtractionResult) -> ExtractionValidation {
        let t = &self.thresholds;
        let quality = &result.quality;
        let confidence = result.confidence;
        let mut issues = Vec::new();

        if confidence < t.failure_confidence {
            issues.push(format!(
                "confidence too low ({:.1} < {})",
                confidence, t.failure_confidence
            ));
        } else if confidence < t.warning_confidence {
            issues.push(format!(
                "confidence low ({:.1} < {})",
                confidence, t.warning_confidence
            ));
        }
        if !quality.is_high_quality {
            issues.push("text is not high quality".to_string());
        }
        if !quality.is_searchable {
            issues.push("text is not searchable".to_string());
        }
        if !quality.has_meaningful_content {
            issues.push("no meaningful content".to_string());
        }
        if quality.word_count < t.min_word_count {
            issues.push(format!(
                "word count too low ({} < {})",
                quality.word_count, t.min_word_count
            ));
        }
        if quality.document_type == DocumentType::Unknown {
            issues.push("unknown document type".to_string());
        }

        let severity = if confidence < t.failure_confidence
            || !quality.is_searchable
            || !quality.has_meaningful_content
        {
            Severity::Failure
        } else if confidence < t.warning_confidence
            || !quality.is_high_quality
            || quality.word_count < t.min_word_count
        {
            Severity::Warning
        } else {
            Severity::Success
        };

        ExtractionValidation { severity, issues }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TextQuality;
    use std::collections::BTreeMap;

    fn result(confidence: f64, quality: TextQuality) -> ExtractionResult {
        ExtractionResult {
            text: String::new(),
            confidence,
            quality,
            fields: BTreeMap::new(),
        }
    }

    fn good_quality() -> TextQuality {
        TextQuality {
            is_searchable: true,
            is_high_quality: true,
            estimated_accuracy: 95.0,
            word_count: 40,
            character_count: 240,
            has_meaningful_content: true,
            document_type: DocumentType::Form,
        }
    }

    #[test]
    fn test_clean_extraction_has_no_issues() {
        let v = ExtractionValidator::default().validate(&result(92.0, good_quality()));
        assert_eq!(v.severity, Severity::Success);
        assert!(v.issues.is_empty());
        assert!(!v.needs_review());
    }

    #[test]
    fn test_low_confidence_is_failure() {
        let v = ExtractionValidator::default().validate(&result(42.0, good_quality()));
        assert_eq!(v.severity, Severity::Failure);
        assert!(v.issues[0].starts_with("confidence too low"));
        assert_eq!(v.issues.len(), 1);
    }

    #[test]
    fn test_medium_confidence_is_warning() {
        let v = ExtractionValidator::default().validate(&result(65.0, good_quality()));
        assert_eq!(v.severity, Severity::Warning);
        assert!(v.issues[0].starts_with("confidence low"));
    }

    #[test]
    fn test_unsearchable_is_failure_even_with_high_confidence() {
        let quality = TextQuality {
            is_searchable: false,
            ..good_quality()
        };
        let v = ExtractionValidator::default().validate(&result(95.0, quality));
        assert_eq!(v.severity, Severity::Failure);
        assert_eq!(v.issues, vec!["text is not searchable".to_string()]);
    }

    #[test]
    fn test_issues_accumulate() {
        let quality = TextQuality {
            is_searchable: false,
            is_high_quality: false,
            estimated_accuracy: 10.0,
            word_count: 2,
            character_count: 9,
            has_meaningful_content: false,
            document_type: DocumentType::Unknown,
        };
        let v = ExtractionValidator::default().validate(&result(30.0, quality));
        assert_eq!(v.severity, Severity::Failure);
        assert_eq!(v.issues.len(), 6);
    }

    #[test]
    fn test_unknown_type_alone_is_success_with_issue() {
        let quality = TextQuality {
            document_type: DocumentType::Unknown,
            ..good_quality()
        };
        let v = ExtractionValidator::default().validate(&result(90.0, quality));
        assert_eq!(v.severity, Severity::Success);
        assert!(v.needs_review());
    }

    #[test]
    fn test_short_text_is_warning() {
        let quality = TextQuality {
            word_count: 12,
            ..good_quality()
        };
        let v = ExtractionValidator::default().validate(&result(90.0, quality));
        assert_eq!(v.severity, Severity::Warning);
    }
}
