//! Heuristic text quality assessment.
//!
//! Turns raw recognizer text and confidence into searchability, quality and
//! document-type signals. Everything here is pure and deterministic.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::QualityConfig;
use crate::models::{DocumentType, TextQuality};

/// Keywords that legitimately precede numbers on school documents.
const NUMERIC_FIELD_KEYWORDS: &[&str] = &[
    "nis", "nisn", "nip", "no", "nomor", "kelas", "tanggal", "tgl", "tahun", "semester", "nilai",
    "date", "id", "telp", "hp", "rt", "rw", "kode",
];

/// How far back (in characters, same line) a keyword may sit before a number.
const KEYWORD_WINDOW: usize = 16;

/// Classification keywords, checked in this order; first match wins.
const DOCUMENT_TYPE_KEYWORDS: &[(DocumentType, &[&str])] = &[
    (
        DocumentType::Academic,
        &[
            "nilai", "rapor", "raport", "transkrip", "transcript", "ujian", "exam", "semester",
            "mata pelajaran", "grade", "score",
        ],
    ),
    (
        DocumentType::Form,
        &[
            "formulir", "form", "daftar hadir", "absensi", "presensi", "attendance",
            "tanda tangan", "isian",
        ],
    ),
    (
        DocumentType::Certificate,
        &["sertifikat", "certificate", "ijazah", "piagam", "diploma", "penghargaan"],
    ),
    (
        DocumentType::Administrative,
        &[
            "surat", "keputusan", "administrasi", "pengumuman", "memo", "letter", "perihal",
            "lampiran",
        ],
    ),
];

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{2,}").unwrap());

static KEYWORD_NEAR: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = NUMERIC_FIELD_KEYWORDS.join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).unwrap()
});

/// Computes `TextQuality` from text and confidence.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextQualityAssessor {
    thresholds: QualityConfig,
}

impl TextQualityAssessor {
    pub fn new(thresholds: QualityConfig) -> Self {
        Self { thresholds }
    }

    /// Assess `text` recognized with `confidence` (0-100).
    pub fn assess(&self, text: &str, confidence: f64) -> TextQuality {
        let confidence = confidence.clamp(0.0, 100.0);
        let word_count = text.split_whitespace().count();
        let character_count = text.chars().count();

        let mut estimated_accuracy = confidence;
        if word_count < 10 {
            estimated_accuracy *= 0.8;
        }
        if has_numeric_noise(text) {
            estimated_accuracy *= 0.7;
        }

        let has_letter = text.chars().any(char::is_alphabetic);

        TextQuality {
            is_searchable: confidence >= self.thresholds.medium_threshold && word_count >= 5,
            is_high_quality: confidence >= self.thresholds.high_threshold && word_count >= 20,
            estimated_accuracy: estimated_accuracy.clamp(0.0, 100.0),
            word_count,
            character_count,
            has_meaningful_content: word_count >= 5 && has_letter,
            document_type: classify_document(text),
        }
    }
}

/// True when a run of 2+ digits appears without a numeric-field keyword
/// shortly before it on the same line.
fn has_numeric_noise(text: &str) -> bool {
    DIGIT_RUN.find_iter(text).any(|m| {
        let before = &text[..m.start()];
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line_prefix = &before[line_start..];
        let window_start = line_prefix
            .char_indices()
            .rev()
            .nth(KEYWORD_WINDOW - 1)
            .map(|(i, _)| i)
            .unwrap_or(0);
        !KEYWORD_NEAR.is_match(&line_prefix[window_start..])
    })
}

/// First-match keyword classification.
pub fn classify_document(text: &str) -> DocumentType {
    let lower = text.to_lowercase();
    DOCUMENT_TYPE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_word(&lower, k)))
        .map(|(doc_type, _)| *doc_type)
        .unwrap_or(DocumentType::Unknown)
}

/// Whole-word (or whole-phrase) containment on lowercase text.
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}
