//! Deterministic line-by-line attendance parsing.

use tracing::debug;

use super::matcher::{compare_names, NameMatch};
use super::status::{status_from_alias, status_from_glyph};
use super::ParsedRecord;
use crate::models::{AttendanceStatus, RosterEntry};

/// Confidence assigned to every regex-tier record before scoring.
pub const REGEX_CONFIDENCE: f64 = 70.0;

/// Column titles found on sheet table headers.
const HEADER_WORDS: &[&str] = &[
    "no", "nis", "nisn", "nama", "name", "status", "keterangan", "ket",
];

/// Leading words of title and metadata lines.
const PREAMBLE_PREFIXES: &[&str] = &["tanggal", "date", "daftar", "kelas"];

fn clean_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

fn is_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    let tokens: Vec<&str> = lower.split_whitespace().map(clean_token).collect();
    if let Some(first) = tokens.first() {
        if PREAMBLE_PREFIXES.iter().any(|p| first.starts_with(p)) {
            return true;
        }
    }
    tokens.iter().filter(|t| HEADER_WORDS.contains(t)).count() >= 2
}

/// True when `number` occurs in `line` with no digit directly on either side.
fn contains_number(line: &str, number: &str) -> bool {
    if number.is_empty() {
        return false;
    }
    line.match_indices(number).any(|(start, _)| {
        let end = start + number.len();
        let before = line[..start].chars().next_back();
        let after = line[end..].chars().next();
        !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
    })
}

/// Classify a line's status by scanning tokens right to left.
///
/// A glyph anywhere in a token wins. Words belonging to the student's own
/// name are never read as alias marks, and neither is a single letter that
/// abbreviates a name word not written out on the line ("Budi S."). The
/// returned index is set only when a whole token was consumed as the mark.
fn classify_status(
    tokens: &[&str],
    name_words: &[String],
) -> Option<(Option<usize>, AttendanceStatus)> {
    let written: Vec<String> = tokens
        .iter()
        .map(|t| clean_token(t).to_lowercase())
        .collect();
    let initials: Vec<char> = name_words
        .iter()
        .filter(|w| !written.contains(w))
        .filter_map(|w| w.chars().next())
        .collect();

    tokens.iter().enumerate().rev().find_map(|(i, token)| {
        if let Some(status) = status_from_glyph(token) {
            return Some((None, status));
        }
        let cleaned = &written[i];
        if cleaned.is_empty() || name_words.contains(cleaned) {
            return None;
        }
        let mut chars = cleaned.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if initials.contains(&c) {
                return None;
            }
        }
        status_from_alias(cleaned).map(|status| (Some(i), status))
    })
}

/// The name part of a line: everything except numbers, glyphs and the mark word.
fn name_segment(tokens: &[&str], status_index: Option<usize>) -> String {
    tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != status_index)
        .map(|(_, t)| clean_token(t))
        .filter(|t| !t.is_empty() && !t.chars().all(|c| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Name candidate used for roster lookup, with every alias word removed.
fn lookup_segment(tokens: &[&str]) -> String {
    let words: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| status_from_alias(clean_token(t)).is_none())
        .collect();
    name_segment(&words, None)
}

fn find_by_name<'r>(line: &str, segment: &str, roster: &'r [RosterEntry]) -> Option<&'r RosterEntry> {
    let lower = line.to_lowercase();
    roster
        .iter()
        .find(|e| compare_names(segment, &e.name) == NameMatch::Exact)
        .or_else(|| {
            roster.iter().find(|e| {
                let name = e.name.trim().to_lowercase();
                !name.is_empty() && lower.contains(&name)
            })
        })
        .or_else(|| {
            roster
                .iter()
                .find(|e| compare_names(segment, &e.name) == NameMatch::Partial)
        })
}

/// Parse one non-header line against the roster.
fn parse_line(line: &str, roster: &[RosterEntry]) -> Option<ParsedRecord> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let by_number = roster
        .iter()
        .find(|e| contains_number(line, e.registration_number.trim()));

    // Resolve the student first so their name words cannot be read as marks
    let entry = by_number.or_else(|| find_by_name(line, &lookup_segment(&tokens), roster))?;

    let name_words: Vec<String> = entry
        .name
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    let (status_index, status) = match classify_status(&tokens, &name_words) {
        Some((index, status)) => (index, status),
        None => {
            debug!("No status mark on line '{}', recording absent", line);
            (None, AttendanceStatus::Absent)
        }
    };

    Some(ParsedRecord {
        registration_number: if by_number.is_some() {
            entry.registration_number.clone()
        } else {
            String::new()
        },
        name: name_segment(&tokens, status_index),
        status,
        notes: None,
        confidence: REGEX_CONFIDENCE,
    })
}

/// Parse attendance lines from raw OCR text.
///
/// Lines that match no roster entry are skipped.
pub fn parse(text: &str, roster: &[RosterEntry]) -> Vec<ParsedRecord> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_header(line))
        .filter_map(|line| parse_line(line, roster))
        .collect()
}
