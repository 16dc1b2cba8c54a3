//! Language-model attendance parsing.
//!
//! The model receives the roster, the status alias table and the OCR text
//! and is asked for a strict JSON object. The first balanced `{...}` in its
//! reply is parsed. Every failure mode turns into [`ParseOutcome::Fallback`].

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::date::normalize_iso_date;
use super::status::{alias_table, status_from_alias};
use super::ParsedRecord;
use crate::llm::{truncate_utf8, LlmError, TextCompletion};
use crate::models::{AttendanceStatus, RosterEntry};

/// Confidence assumed when the model omits one.
const DEFAULT_AI_CONFIDENCE: f64 = 70.0;

/// Records and date returned by a successful model call.
#[derive(Debug, Clone, PartialEq)]
pub struct AiParse {
    /// Validated `YYYY-MM-DD`, if the model supplied a usable one.
    pub date: Option<String>,
    pub records: Vec<ParsedRecord>,
}

/// Result of the AI tier.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    AiSuccess(AiParse),
    Fallback { reason: String },
}

impl ParseOutcome {
    fn fallback(reason: impl Into<String>) -> Self {
        Self::Fallback {
            reason: reason.into(),
        }
    }
}

/// Settings for one AI-tier call.
#[derive(Debug, Clone)]
pub struct AiTierOptions {
    pub prompt_template: String,
    pub max_content_chars: usize,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct AiResponse {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    records: Vec<AiRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiRecord {
    #[serde(default)]
    registration_number: Option<StringOrNumber>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Models sometimes emit registration numbers as bare integers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            Self::String(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

fn roster_lines(roster: &[RosterEntry]) -> String {
    roster
        .iter()
        .map(|e| format!("{} | {} | {}", e.id, e.registration_number, e.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fill the prompt template for `text` and `roster`.
pub fn build_prompt(template: &str, text: &str, roster: &[RosterEntry], max_chars: usize) -> String {
    template
        .replace("{roster}", &roster_lines(roster))
        .replace("{aliases}", &alias_table())
        .replace("{content}", truncate_utf8(text, max_chars))
}

/// First balanced `{...}` substring, ignoring braces inside JSON strings.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in response[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&response[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn resolve_status(raw: Option<&str>) -> AttendanceStatus {
    match raw.and_then(status_from_alias) {
        Some(status) => status,
        None => {
            debug!("Unrecognized status {:?} from model, recording absent", raw);
            AttendanceStatus::Absent
        }
    }
}

/// Interpret a raw model reply.
pub fn interpret_response(response: &str) -> ParseOutcome {
    if response.trim().is_empty() {
        return ParseOutcome::fallback(LlmError::Empty.to_string());
    }
    let Some(json) = extract_json_object(response) else {
        return ParseOutcome::fallback("no JSON object in response");
    };
    let parsed: AiResponse = match serde_json::from_str(json) {
        Ok(parsed) => parsed,
        Err(e) => return ParseOutcome::fallback(format!("malformed JSON: {}", e)),
    };
    if parsed.records.is_empty() {
        return ParseOutcome::fallback("no records in response");
    }

    let records = parsed
        .records
        .into_iter()
        .map(|r| ParsedRecord {
            registration_number: r
                .registration_number
                .map(StringOrNumber::into_string)
                .unwrap_or_default(),
            name: r.name.unwrap_or_default(),
            status: resolve_status(r.status.as_deref()),
            notes: r.notes.filter(|n| !n.trim().is_empty()),
            confidence: r.confidence.unwrap_or(DEFAULT_AI_CONFIDENCE),
        })
        .collect();

    ParseOutcome::AiSuccess(AiParse {
        date: parsed.date.as_deref().and_then(normalize_iso_date),
        records,
    })
}

/// Ask the model to parse `text`, bounded by `options.timeout`.
pub async fn parse(
    completion: &dyn TextCompletion,
    text: &str,
    roster: &[RosterEntry],
    options: &AiTierOptions,
) -> ParseOutcome {
    let prompt = build_prompt(
        &options.prompt_template,
        text,
        roster,
        options.max_content_chars,
    );

    match tokio::time::timeout(options.timeout, completion.complete(&prompt)).await {
        Ok(Ok(response)) => interpret_response(&response),
        Ok(Err(e)) => ParseOutcome::fallback(e.to_string()),
        Err(_) => ParseOutcome::fallback(LlmError::Timeout(options.timeout).to_string()),
    }
}
