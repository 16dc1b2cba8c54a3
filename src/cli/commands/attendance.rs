//! Attendance sheet command.

use std::path::Path;
use std::sync::Arc;

use console::style;

use rollcall::attendance::{AttendanceOutcome, AttendanceProcessor};
use rollcall::config::Config;
use rollcall::llm::LlmClient;
use rollcall::models::RosterEntry;

use super::helpers::{build_gateway, open_emitter, progress_bar, severity_style, MetadataArgs};

async fn load_roster(path: &Path) -> anyhow::Result<Vec<RosterEntry>> {
    let contents = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Invalid roster {}: {}", path.display(), e))
}

/// Process one attendance sheet against a roster.
pub async fn cmd_attendance(
    config: &Config,
    file: &Path,
    roster_path: &Path,
    metadata: &MetadataArgs,
    no_ai: bool,
    json: bool,
) -> anyhow::Result<()> {
    let roster = load_roster(roster_path).await?;
    let content = tokio::fs::read(file).await?;

    let emitter = open_emitter(config).await?;
    let gateway = Arc::new(build_gateway(config, emitter));
    let mut processor = AttendanceProcessor::from_config(config, Arc::clone(&gateway));

    if !no_ai && config.llm.enabled() {
        let client = LlmClient::new(config.llm.clone())?;
        if client.is_available().await {
            tracing::info!(
                "Using {} model {} for parsing",
                config.llm.provider_name(),
                config.llm.model()
            );
            processor = processor.with_completion(Arc::new(client));
        } else {
            tracing::warn!(
                "{} at {} is not reachable, using regex parser",
                config.llm.provider_name(),
                config.llm.endpoint()
            );
        }
    }

    let label = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let (pb, progress) = progress_bar(&label)?;
    let outcome = processor
        .process_attendance_sheet(&content, &roster, &metadata.for_file(file), Some(&progress))
        .await;
    pb.finish_and_clear();
    gateway.terminate().await;

    let outcome = outcome?;
    if json {
        println!("{}", serde_json::to_string_pretty(&to_json(&outcome))?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn to_json(outcome: &AttendanceOutcome) -> serde_json::Value {
    serde_json::json!({
        "sheet": outcome.sheet,
        "tier": outcome.tier,
        "extraction": {
            "confidence": outcome.extraction.confidence,
            "quality": outcome.extraction.quality,
            "validation": outcome.extraction_validation,
        },
        "validation": outcome.sheet_validation,
        "unmatchedRecords": outcome.unmatched_records,
        "cacheHit": outcome.cache_hit,
    })
}

fn print_outcome(outcome: &AttendanceOutcome) {
    let sheet = &outcome.sheet;
    println!(
        "{} Attendance for {} ({} parser, OCR {:.1}%)",
        style("●").cyan(),
        style(&sheet.date).bold(),
        outcome.tier.as_str(),
        outcome.extraction.confidence
    );

    for record in &sheet.records {
        println!(
            "  {:<10} {:<28} {:<10} {:>5.1}%{}",
            record.registration_number,
            record.name,
            record.status,
            record.confidence,
            record
                .notes
                .as_ref()
                .map(|n| format!("  ({})", n))
                .unwrap_or_default()
        );
    }

    let summary = &sheet.summary;
    println!(
        "\n  present {}  sick {}  permission {}  absent {}  (total {})",
        style(summary.present).green(),
        style(summary.sick).yellow(),
        style(summary.permission).cyan(),
        style(summary.absent).red(),
        summary.total()
    );
    if outcome.unmatched_records > 0 {
        println!(
            "  {} {} line(s) matched no roster entry",
            style("!").yellow(),
            outcome.unmatched_records
        );
    }

    let validation = &outcome.sheet_validation;
    println!("\n  sheet: {}", severity_style(validation.severity()));
    for error in &validation.errors {
        println!("    {} {}", style("✗").red(), error);
    }
    for warning in &validation.warnings {
        println!("    {} {}", style("!").yellow(), warning);
    }
}
