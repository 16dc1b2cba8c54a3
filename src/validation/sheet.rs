//! Attendance sheet validation.

use std::collections::HashSet;

use serde::Serialize;

use crate::attendance::is_iso_date;
use crate::models::{AttendanceSheet, RosterEntry, Severity};

/// Errors and warnings for a finalized sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl SheetValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn severity(&self) -> Severity {
        if !self.errors.is_empty() {
            Severity::Failure
        } else if !self.warnings.is_empty() {
            Severity::Warning
        } else {
            Severity::Success
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SheetValidator {
    /// Mean record confidence below this raises a warning.
    attendance_confidence: f64,
}

impl Default for SheetValidator {
    fn default() -> Self {
        Self::new(75.0)
    }
}

impl SheetValidator {
    pub fn new(attendance_confidence: f64) -> Self {
        Self {
            attendance_confidence,
        }
    }

    pub fn validate(&self, sheet: &AttendanceSheet, roster: &[RosterEntry]) -> SheetValidation {
        let mut validation = SheetValidation::default();

        if !is_iso_date(&sheet.date) {
            validation
                .errors
                .push(format!("invalid date '{}', expected YYYY-MM-DD", sheet.date));
        }
        if sheet.records.is_empty() {
            validation.errors.push("no records matched the roster".to_string());
        }

        let matched: HashSet<&str> = sheet.records.iter().map(|r| r.student_id.as_str()).collect();
        let missing = roster
            .iter()
            .filter(|e| !matched.contains(e.id.as_str()))
            .count();
        if missing > 0 {
            validation
                .warnings
                .push(format!("{} roster member(s) not found on the sheet", missing));
        }

        if !sheet.records.is_empty() {
            let mean = sheet.records.iter().map(|r| r.confidence).sum::<f64>()
                / sheet.records.len() as f64;
            if mean < self.attendance_confidence {
                validation.warnings.push(format!(
                    "mean record confidence {:.1} below {}",
                    mean, self.attendance_confidence
                ));
            }
        }

        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceRecord, AttendanceStatus};

    fn record(student_id: &str, confidence: f64) -> AttendanceRecord {
        AttendanceRecord {
            student_id: student_id.to_string(),
            registration_number: "0".to_string(),
            name: student_id.to_string(),
            status: AttendanceStatus::Present,
            notes: None,
            confidence,
        }
    }

    fn roster() -> Vec<RosterEntry> {
        vec![
            RosterEntry::new("s1", "001", "Ahmad"),
            RosterEntry::new("s2", "002", "Siti"),
        ]
    }

    #[test]
    fn test_complete_sheet_is_clean() {
        let sheet = AttendanceSheet::new("2026-01-30", vec![record("s1", 100.0), record("s2", 85.0)]);
        let v = SheetValidator::default().validate(&sheet, &roster());
        assert!(v.is_valid());
        assert!(v.warnings.is_empty());
        assert_eq!(v.severity(), Severity::Success);
    }

    #[test]
    fn test_empty_sheet_is_an_error() {
        let v = SheetValidator::default().validate(&AttendanceSheet::empty("2026-01-30"), &roster());
        assert!(!v.is_valid());
        assert_eq!(v.errors, vec!["no records matched the roster".to_string()]);
        assert_eq!(v.warnings, vec!["2 roster member(s) not found on the sheet".to_string()]);
        assert_eq!(v.severity(), Severity::Failure);
    }

    #[test]
    fn test_bad_date_is_an_error() {
        let sheet = AttendanceSheet::new("30-01-2026", vec![record("s1", 100.0), record("s2", 100.0)]);
        let v = SheetValidator::default().validate(&sheet, &roster());
        assert_eq!(v.errors.len(), 1);
        assert!(v.errors[0].contains("30-01-2026"));
    }

    #[test]
    fn test_missing_members_and_low_confidence_warn() {
        let sheet = AttendanceSheet::new("2026-01-30", vec![record("s1", 50.0)]);
        let v = SheetValidator::default().validate(&sheet, &roster());
        assert!(v.is_valid());
        assert_eq!(v.warnings.len(), 2);
        assert!(v.warnings[0].starts_with("1 roster member"));
        assert!(v.warnings[1].contains("50.0"));
        assert_eq!(v.severity(), Severity::Warning);
    }
}
