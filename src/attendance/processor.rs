//! End-to-end attendance sheet processing.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::ai_tier::{self, AiTierOptions, ParseOutcome};
use super::date::{extract_date, today};
use super::matcher::{match_records, MatchReport};
use super::{regex_tier, ParsedRecord};
use crate::config::{Config, ValidationConfig};
use crate::llm::{LlmConfig, TextCompletion};
use crate::models::{
    report, AttendanceSheet, DocumentMetadata, ExtractionResult, Phase, ProgressFn,
    ProgressUpdate, RosterEntry,
};
use crate::ocr::{ExtractionError, ExtractionGateway};
use crate::validation::{ExtractionValidation, SheetValidation, SheetValidator};

/// Share of the progress bar given to the extraction stage.
const EXTRACTION_SHARE: u32 = 60;

/// Which tier produced the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseTier {
    Ai,
    Regex,
    /// Text was empty or too unreliable to parse.
    Skipped,
}

impl ParseTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Regex => "regex",
            Self::Skipped => "skipped",
        }
    }
}

/// Aggregated result of processing one sheet.
#[derive(Debug, Clone)]
pub struct AttendanceOutcome {
    pub sheet: AttendanceSheet,
    pub tier: ParseTier,
    pub extraction: Arc<ExtractionResult>,
    pub extraction_validation: ExtractionValidation,
    pub sheet_validation: SheetValidation,
    /// Parsed lines that matched nobody on the roster.
    pub unmatched_records: usize,
    pub cache_hit: bool,
}

/// Runs extraction, parsing, roster matching and sheet validation.
pub struct AttendanceProcessor {
    gateway: Arc<ExtractionGateway>,
    completion: Option<Arc<dyn TextCompletion>>,
    ai_options: AiTierOptions,
    sheet_validator: SheetValidator,
    /// Below this recognizer confidence a sheet is not parsed at all.
    min_parse_confidence: f64,
}

impl AttendanceProcessor {
    /// A processor that only uses the regex tier.
    pub fn new(gateway: Arc<ExtractionGateway>) -> Self {
        let llm = LlmConfig::default();
        Self {
            gateway,
            completion: None,
            ai_options: AiTierOptions {
                prompt_template: llm.app.get_attendance_prompt().to_string(),
                max_content_chars: llm.app.max_content_chars,
                timeout: llm.timeout(),
            },
            sheet_validator: SheetValidator::default(),
            min_parse_confidence: ValidationConfig::default().failure_confidence,
        }
    }

    pub fn from_config(config: &Config, gateway: Arc<ExtractionGateway>) -> Self {
        Self {
            ai_options: AiTierOptions {
                prompt_template: config.llm.app.get_attendance_prompt().to_string(),
                max_content_chars: config.llm.app.max_content_chars,
                timeout: config.llm.timeout(),
            },
            sheet_validator: SheetValidator::new(config.validation.attendance_confidence),
            min_parse_confidence: config.validation.failure_confidence,
            ..Self::new(gateway)
        }
    }

    /// Enable the AI tier.
    pub fn with_completion(mut self, completion: Arc<dyn TextCompletion>) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn with_ai_options(mut self, options: AiTierOptions) -> Self {
        self.ai_options = options;
        self
    }

    pub fn gateway(&self) -> &ExtractionGateway {
        &self.gateway
    }

    /// Turn a photographed sheet into roster-matched attendance.
    ///
    /// Empty or low-confidence text yields an empty sheet, not an error.
    /// Only extraction failures are returned as errors.
    pub async fn process_attendance_sheet(
        &self,
        content: &[u8],
        roster: &[RosterEntry],
        metadata: &DocumentMetadata,
        progress: Option<&ProgressFn>,
    ) -> Result<AttendanceOutcome, ExtractionError> {
        let scaled = progress.map(scale_extraction_progress);
        let extraction = self.gateway.extract(content, metadata, scaled.as_ref()).await?;
        let result = Arc::clone(&extraction.result);

        let (sheet, tier, unmatched_records) =
            if result.text.trim().is_empty() || result.confidence < self.min_parse_confidence {
                info!(
                    "Skipping parse of document {} ({:.1}% confidence)",
                    extraction.document_id, result.confidence
                );
                let date = extract_date(&result.text, today());
                (AttendanceSheet::empty(date), ParseTier::Skipped, 0)
            } else {
                self.build_sheet(&result.text, roster, progress).await
            };

        let sheet_validation = self.sheet_validator.validate(&sheet, roster);
        report(progress, Phase::Complete, 100, "Attendance processed");

        Ok(AttendanceOutcome {
            sheet,
            tier,
            extraction: result,
            extraction_validation: extraction.validation,
            sheet_validation,
            unmatched_records,
            cache_hit: extraction.cache_hit,
        })
    }

    /// Parse `text` with the best available tier and match against `roster`.
    pub async fn build_sheet(
        &self,
        text: &str,
        roster: &[RosterEntry],
        progress: Option<&ProgressFn>,
    ) -> (AttendanceSheet, ParseTier, usize) {
        report(progress, Phase::Parsing, 70, "Parsing attendance");
        let (date, parsed, tier) = self.parse(text, roster).await;
        let date = date.unwrap_or_else(|| extract_date(text, today()));

        report(progress, Phase::Matching, 85, "Matching roster");
        let MatchReport {
            records,
            discarded,
            duplicates,
        } = match_records(&parsed, roster);
        debug!(
            "Matched {} records ({} unmatched, {} duplicates) via {} tier",
            records.len(),
            discarded,
            duplicates,
            tier.as_str()
        );

        (AttendanceSheet::new(date, records), tier, discarded)
    }

    /// Try the AI tier, falling back to the regex tier.
    async fn parse(
        &self,
        text: &str,
        roster: &[RosterEntry],
    ) -> (Option<String>, Vec<ParsedRecord>, ParseTier) {
        let outcome = match &self.completion {
            Some(completion) => ai_tier::parse(completion.as_ref(), text, roster, &self.ai_options).await,
            None => ParseOutcome::Fallback {
                reason: "no language model configured".to_string(),
            },
        };

        match outcome {
            ParseOutcome::AiSuccess(parse) => (parse.date, parse.records, ParseTier::Ai),
            ParseOutcome::Fallback { reason } => {
                info!("Using regex parser: {}", reason);
                (None, regex_tier::parse(text, roster), ParseTier::Regex)
            }
        }
    }
}

/// Map extraction progress into the first part of the bar and hold back
/// its completion report.
fn scale_extraction_progress(progress: &ProgressFn) -> ProgressFn {
    let inner = Arc::clone(progress);
    Arc::new(move |update: &ProgressUpdate| {
        if update.phase == Phase::Complete {
            return;
        }
        inner(&ProgressUpdate {
            status: update.status.clone(),
            phase: update.phase,
            percent: (u32::from(update.percent) * EXTRACTION_SHARE / 100) as u8,
        });
    })
}
