//! Validation event emission.
//!
//! Events are appended to a bounded log and broadcast in-process to any
//! subscriber. Persistence failures are logged and never reach the caller.

mod memory;

pub use memory::MemoryEventStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::EventsConfig;
use crate::models::{DocumentMetadata, ExtractionResult, ValidationEvent};
use crate::validation::ExtractionValidation;

/// Errors from event storage backends.
#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence port for the validation event log.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append `event`, then evict the oldest entries beyond `capacity`.
    async fn append(&self, event: &ValidationEvent, capacity: usize) -> Result<(), EventStoreError>;

    /// Newest-first events, at most `limit`.
    async fn recent(&self, limit: usize) -> Result<Vec<ValidationEvent>, EventStoreError>;
}

/// Persists and broadcasts validation events.
#[derive(Clone)]
pub struct EventEmitter {
    store: Arc<dyn EventStore>,
    capacity: usize,
    tx: broadcast::Sender<ValidationEvent>,
}

impl EventEmitter {
    pub fn new(store: Arc<dyn EventStore>, config: &EventsConfig) -> Self {
        let (tx, _) = broadcast::channel(config.broadcast_buffer.max(1));
        info!(
            "Event emitter initialized (log capacity {}, buffer {})",
            config.capacity, config.broadcast_buffer
        );
        Self {
            store,
            capacity: config.capacity,
            tx,
        }
    }

    /// An emitter backed by an in-memory log.
    pub fn in_memory(config: &EventsConfig) -> Self {
        Self::new(Arc::new(MemoryEventStore::new()), config)
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ValidationEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Build the event for one validated extraction.
    ///
    /// Returns `None` when the validation found no issues.
    pub fn build_event(
        validation: &ExtractionValidation,
        result: &ExtractionResult,
        metadata: &DocumentMetadata,
        document_id: &str,
    ) -> Option<ValidationEvent> {
        if !validation.needs_review() {
            return None;
        }
        Some(ValidationEvent {
            id: ValidationEvent::event_id(validation.severity, document_id),
            severity: validation.severity,
            document_id: document_id.to_string(),
            document_type: metadata
                .document_type
                .clone()
                .unwrap_or_else(|| result.quality.document_type.as_str().to_string()),
            confidence: result.confidence,
            issues: validation.issues.clone(),
            timestamp: Utc::now(),
            user_id: metadata.user_id.clone().unwrap_or_else(|| "system".to_string()),
            user_role: metadata
                .user_role
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            action_url: metadata.action_url.clone(),
        })
    }

    /// Record a validation outcome, emitting an event if it has issues.
    pub async fn record(
        &self,
        validation: &ExtractionValidation,
        result: &ExtractionResult,
        metadata: &DocumentMetadata,
        document_id: &str,
    ) -> Option<ValidationEvent> {
        let event = Self::build_event(validation, result, metadata, document_id)?;
        self.emit(event.clone()).await;
        Some(event)
    }

    /// Persist and broadcast `event`. Never fails.
    pub async fn emit(&self, event: ValidationEvent) {
        if let Err(e) = self.store.append(&event, self.capacity).await {
            warn!("Failed to persist validation event {}: {}", event.id, e);
        }

        match self.tx.send(event) {
            Ok(count) => debug!("Broadcast validation event to {} subscribers", count),
            Err(_) => debug!("No subscribers for validation event"),
        }
    }

    /// Newest-first events from the log.
    pub async fn recent(&self, limit: usize) -> Result<Vec<ValidationEvent>, EventStoreError> {
        self.store.recent(limit).await
    }
}
