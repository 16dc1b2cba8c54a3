//! Validation event log command.

use console::style;

use rollcall::config::Config;

use super::helpers::{open_event_repository, severity_style};

/// Show the most recent validation events.
pub async fn cmd_events(config: &Config, limit: usize, json: bool) -> anyhow::Result<()> {
    let repo = open_event_repository(config).await?;
    let events = repo.get_recent(limit).await?;

    if events.is_empty() {
        if !json {
            println!("{} No validation events", style("!").yellow());
        }
        return Ok(());
    }

    for event in &events {
        if json {
            println!("{}", serde_json::to_string(event)?);
            continue;
        }
        println!(
            "{} {:<8} {} {} ({:.1}%) by {} [{}]",
            style(event.timestamp.format("%Y-%m-%d %H:%M:%S")).dim(),
            severity_style(event.severity),
            style(&event.document_id).bold(),
            event.document_type,
            event.confidence,
            event.user_id,
            event.user_role
        );
        for issue in &event.issues {
            println!("    {}", issue);
        }
        if let Some(url) = &event.action_url {
            println!("    {} {}", style("→").dim(), url);
        }
    }

    Ok(())
}
