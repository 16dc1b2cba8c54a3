//! Generic document extraction command.

use std::path::PathBuf;

use console::style;

use rollcall::config::Config;
use rollcall::ocr::Extraction;

use super::helpers::{build_gateway, open_emitter, progress_bar, severity_style};

/// Extract every file and print a summary for each.
pub async fn cmd_extract(
    config: &Config,
    files: &[PathBuf],
    metadata: &super::helpers::MetadataArgs,
    json: bool,
) -> anyhow::Result<()> {
    let emitter = open_emitter(config).await?;
    let gateway = build_gateway(config, emitter);
    let mut failures = 0usize;

    for path in files {
        let content = tokio::fs::read(path).await?;
        let doc_metadata = metadata.for_file(path);
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let (pb, progress) = progress_bar(&label)?;
        let outcome = gateway.extract(&content, &doc_metadata, Some(&progress)).await;
        pb.finish_and_clear();

        match outcome {
            Ok(extraction) if json => println!("{}", serde_json::to_string(extraction.result.as_ref())?),
            Ok(extraction) => print_extraction(path, &extraction),
            Err(e) => {
                failures += 1;
                eprintln!("{} {}: {}", style("✗").red(), path.display(), e);
            }
        }
    }

    gateway.terminate().await;

    if !json {
        let stats = gateway.cache_stats();
        println!(
            "\n{} cache: {} hits, {} misses, {} entries",
            style("→").dim(),
            stats.hits,
            stats.misses,
            stats.size
        );
    }

    if failures > 0 {
        anyhow::bail!("{} of {} files failed", failures, files.len());
    }
    Ok(())
}

fn print_extraction(path: &std::path::Path, extraction: &Extraction) {
    let result = &extraction.result;
    let quality = &result.quality;

    println!(
        "{} {} [{}]{}",
        style("●").cyan(),
        style(path.display()).bold(),
        severity_style(extraction.validation.severity),
        if extraction.cache_hit { " (cached)" } else { "" }
    );
    println!(
        "  confidence {:.1}%  accuracy {:.1}%  {} words  type {}",
        result.confidence,
        quality.estimated_accuracy,
        quality.word_count,
        quality.document_type
    );
    for (key, value) in &result.fields {
        println!("  {}: {}", style(key).dim(), value);
    }
    for issue in &extraction.validation.issues {
        println!("  {} {}", style("!").yellow(), issue);
    }
}
