//! Roster matching and confidence scoring.
//!
//! Parsed records are resolved against the roster in priority order:
//! registration number, exact name, then substring name containment.
//! Records that resolve to nobody are discarded.

use std::collections::HashSet;

use tracing::debug;

use super::ParsedRecord;
use crate::models::{AttendanceRecord, RosterEntry};

const REGISTRATION_BOOST: f64 = 15.0;
const EXACT_NAME_BOOST: f64 = 15.0;
const PARTIAL_NAME_PENALTY: f64 = 20.0;

/// Shortest name fragment allowed to take part in substring matching.
const MIN_PARTIAL_LEN: usize = 3;

/// How two names compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    Exact,
    Partial,
    None,
}

/// Which rule resolved a record to a roster entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    RegistrationNumber,
    ExactName,
    PartialName,
}

/// Finalized records plus what could not be placed.
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    pub records: Vec<AttendanceRecord>,
    /// Parsed records that matched no roster entry.
    pub discarded: usize,
    /// Parsed records dropped because their student was already matched.
    pub duplicates: usize,
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Compare two names case-insensitively, ignoring spacing.
pub fn compare_names(a: &str, b: &str) -> NameMatch {
    let a = normalize_name(a);
    let b = normalize_name(b);
    if a.is_empty() || b.is_empty() {
        return NameMatch::None;
    }
    if a == b {
        return NameMatch::Exact;
    }
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (&a, &b)
    } else {
        (&b, &a)
    };
    if short.chars().count() >= MIN_PARTIAL_LEN && long.contains(short.as_str()) {
        NameMatch::Partial
    } else {
        NameMatch::None
    }
}

/// Resolve one parsed record to a roster entry.
pub fn match_entry<'r>(
    record: &ParsedRecord,
    roster: &'r [RosterEntry],
) -> Option<(&'r RosterEntry, MatchKind)> {
    let registration = record.registration_number.trim();
    if !registration.is_empty() {
        if let Some(entry) = roster
            .iter()
            .find(|e| e.registration_number.trim() == registration)
        {
            return Some((entry, MatchKind::RegistrationNumber));
        }
    }

    if let Some(entry) = roster
        .iter()
        .find(|e| compare_names(&record.name, &e.name) == NameMatch::Exact)
    {
        return Some((entry, MatchKind::ExactName));
    }

    roster
        .iter()
        .find(|e| compare_names(&record.name, &e.name) == NameMatch::Partial)
        .map(|entry| (entry, MatchKind::PartialName))
}

/// Compose the final confidence for a matched record, clamped to 0-100.
pub fn score(base: f64, registration_matched: bool, name: NameMatch) -> f64 {
    let mut confidence = if base.is_finite() { base } else { 0.0 };
    if registration_matched {
        confidence += REGISTRATION_BOOST;
    }
    match name {
        NameMatch::Exact => confidence += EXACT_NAME_BOOST,
        NameMatch::Partial if !registration_matched => confidence -= PARTIAL_NAME_PENALTY,
        _ => {}
    }
    confidence.clamp(0.0, 100.0)
}

/// Match every parsed record against the roster.
///
/// The first record for a student wins; later ones are dropped.
pub fn match_records(parsed: &[ParsedRecord], roster: &[RosterEntry]) -> MatchReport {
    let mut report = MatchReport::default();
    let mut seen: HashSet<&str> = HashSet::new();

    for record in parsed {
        let Some((entry, kind)) = match_entry(record, roster) else {
            debug!(
                "No roster match for '{}' ({})",
                record.name, record.registration_number
            );
            report.discarded += 1;
            continue;
        };

        if !seen.insert(entry.id.as_str()) {
            debug!("Duplicate line for student {}, keeping the first", entry.id);
            report.duplicates += 1;
            continue;
        }

        let confidence = score(
            record.confidence,
            kind == MatchKind::RegistrationNumber,
            compare_names(&record.name, &entry.name),
        );

        report.records.push(AttendanceRecord {
            student_id: entry.id.clone(),
            registration_number: entry.registration_number.clone(),
            name: entry.name.clone(),
            status: record.status,
            notes: record.notes.clone(),
            confidence,
        });
    }

    report
}
