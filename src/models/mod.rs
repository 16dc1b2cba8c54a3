//! Data models for rollcall.

mod attendance;
mod extraction;
mod progress;
mod validation;

pub use attendance::{
    AttendanceRecord, AttendanceSheet, AttendanceStatus, AttendanceSummary, RosterEntry,
};
pub use extraction::{DocumentMetadata, DocumentType, ExtractionResult, TextQuality};
pub(crate) use progress::report;
pub use progress::{Phase, ProgressFn, ProgressUpdate};
pub use validation::{Severity, ValidationEvent};
