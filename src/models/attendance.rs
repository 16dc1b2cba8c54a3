//! Attendance models: roster entries, parsed records and finalized sheets.

use serde::{Deserialize, Serialize};

/// One enrolled student eligible for matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: String,
    /// Local class-roster identifier (NIS).
    pub registration_number: String,
    pub name: String,
}

impl RosterEntry {
    pub fn new(
        id: impl Into<String>,
        registration_number: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            registration_number: registration_number.into(),
            name: name.into(),
        }
    }
}

/// Attendance status of a student for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Sick,
    Permission,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Sick => "sick",
            Self::Permission => "permission",
            Self::Absent => "absent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "present" => Some(Self::Present),
            "sick" => Some(Self::Sick),
            "permission" => Some(Self::Permission),
            "absent" => Some(Self::Absent),
            _ => None,
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single attendance line, either parsed or finalized against the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub student_id: String,
    pub registration_number: String,
    pub name: String,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 0-100.
    pub confidence: f64,
}

/// Per-status counts for a sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub present: usize,
    pub sick: usize,
    pub permission: usize,
    pub absent: usize,
}

impl AttendanceSummary {
    /// Count statuses across finalized records.
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Sick => summary.sick += 1,
                AttendanceStatus::Permission => summary.permission += 1,
                AttendanceStatus::Absent => summary.absent += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.present + self.sick + self.permission + self.absent
    }
}

/// A finalized attendance sheet. `summary.total() == records.len()` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSheet {
    /// ISO-8601 `YYYY-MM-DD`.
    pub date: String,
    pub records: Vec<AttendanceRecord>,
    pub summary: AttendanceSummary,
}

impl AttendanceSheet {
    /// Build a sheet, deriving the summary from the records.
    pub fn new(date: impl Into<String>, records: Vec<AttendanceRecord>) -> Self {
        let summary = AttendanceSummary::from_records(&records);
        Self {
            date: date.into(),
            records,
            summary,
        }
    }

    /// A well-formed sheet with no records.
    pub fn empty(date: impl Into<String>) -> Self {
        Self::new(date, Vec::new())
    }
}
