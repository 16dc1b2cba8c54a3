//! Attendance-sheet parsing.
//!
//! OCR text is turned into attendance records by one of two tiers: a
//! language-model delegate, or a deterministic line parser when the model
//! is unavailable or returns nothing usable. Parsed records are then
//! resolved against the class roster and scored.

pub mod ai_tier;
mod date;
pub mod matcher;
mod processor;
pub mod regex_tier;
mod status;

pub use ai_tier::{AiParse, AiTierOptions, ParseOutcome};
pub use date::{extract_date, find_date, is_iso_date, normalize_iso_date, today};
pub use matcher::{match_records, MatchKind, MatchReport, NameMatch};
pub use processor::{AttendanceOutcome, AttendanceProcessor, ParseTier};
pub use status::{alias_table, status_from_alias, STATUS_ALIASES};

use crate::models::AttendanceStatus;

/// A record as read from the sheet, before roster resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    /// Empty when the sheet line carried no known registration number.
    pub registration_number: String,
    pub name: String,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    /// Parser-reported confidence, 0-100.
    pub confidence: f64,
}
