//! Shared helper functions for CLI commands.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Args;
use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};

use rollcall::config::Config;
use rollcall::events::EventEmitter;
use rollcall::models::{DocumentMetadata, ProgressFn, ProgressUpdate, Severity};
use rollcall::ocr::{ExtractionGateway, TesseractBackend};
use rollcall::repository::{AsyncSqlitePool, DieselValidationEventRepository};

/// Document metadata flags shared by extraction commands.
#[derive(Args, Debug, Clone, Default)]
pub struct MetadataArgs {
    /// Document id used in validation events (default: content hash prefix)
    #[arg(long)]
    pub document_id: Option<String>,
    /// Uploading user
    #[arg(long)]
    pub user_id: Option<String>,
    /// Role of the uploading user
    #[arg(long)]
    pub role: Option<String>,
    /// Document type reported in validation events
    #[arg(long)]
    pub document_type: Option<String>,
    /// Link included in validation events
    #[arg(long)]
    pub action_url: Option<String>,
}

impl MetadataArgs {
    /// Metadata for `path`, including its modification time.
    pub fn for_file(&self, path: &Path) -> DocumentMetadata {
        let modified_at = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        DocumentMetadata {
            document_id: self.document_id.clone(),
            user_id: self.user_id.clone(),
            user_role: self.role.clone(),
            document_type: self.document_type.clone(),
            action_url: self.action_url.clone(),
            modified_at,
        }
    }
}

/// Open the persisted event log and wrap it in an emitter.
pub async fn open_emitter(config: &Config) -> anyhow::Result<EventEmitter> {
    let repo = open_event_repository(config).await?;
    Ok(EventEmitter::new(Arc::new(repo), &config.events))
}

pub async fn open_event_repository(
    config: &Config,
) -> anyhow::Result<DieselValidationEventRepository> {
    let db_path = config.events.database_path();
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let pool = AsyncSqlitePool::from_path(&db_path);
    DieselValidationEventRepository::open(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", db_path.display(), e))
}

/// Gateway over the configured Tesseract backend.
pub fn build_gateway(config: &Config, events: EventEmitter) -> ExtractionGateway {
    let backend = TesseractBackend::with_settings(config.ocr.clone());
    ExtractionGateway::from_config(config, Arc::new(backend), events)
}

/// A progress bar and a callback that drives it.
pub fn progress_bar(label: &str) -> anyhow::Result<(ProgressBar, ProgressFn)> {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.bold} {spinner:.green} [{bar:30.cyan/blue}] {pos:>3}% {wide_msg}")?
            .progress_chars("█▓░"),
    );
    pb.set_prefix(label.to_string());

    let bar = pb.clone();
    let callback: ProgressFn = Arc::new(move |update: &ProgressUpdate| {
        bar.set_position(u64::from(update.percent));
        bar.set_message(update.status.clone());
    });
    Ok((pb, callback))
}

pub fn severity_style(severity: Severity) -> StyledObject<&'static str> {
    match severity {
        Severity::Failure => style(severity.as_str()).red().bold(),
        Severity::Warning => style(severity.as_str()).yellow(),
        Severity::Success => style(severity.as_str()).green(),
    }
}
