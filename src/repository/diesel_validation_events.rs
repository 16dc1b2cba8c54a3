//! Diesel-based validation event log for SQLite.
//!
//! Uses diesel-async's SyncConnectionWrapper for async SQLite support.
//! The log is bounded: every append prunes rows beyond the capacity,
//! oldest first.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{RunQueryDsl, SimpleAsyncConnection};

use super::diesel_models::{NewValidationEvent, ValidationEventRecord};
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::util::parse_datetime;
use crate::events::{EventStore, EventStoreError};
use crate::models::{Severity, ValidationEvent};
use crate::schema::validation_events;

const CREATE_VALIDATION_EVENTS: &str = r#"
CREATE TABLE IF NOT EXISTS validation_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id TEXT NOT NULL,
    severity TEXT NOT NULL,
    document_id TEXT NOT NULL,
    document_type TEXT NOT NULL,
    confidence REAL NOT NULL,
    issues TEXT NOT NULL DEFAULT '[]',
    timestamp TEXT NOT NULL,
    user_id TEXT NOT NULL,
    user_role TEXT NOT NULL,
    action_url TEXT
);
CREATE INDEX IF NOT EXISTS idx_validation_events_document ON validation_events(document_id);
"#;

impl From<ValidationEventRecord> for ValidationEvent {
    fn from(record: ValidationEventRecord) -> Self {
        ValidationEvent {
            id: record.event_id,
            severity: Severity::from_str(&record.severity).unwrap_or(Severity::Failure),
            document_id: record.document_id,
            document_type: record.document_type,
            confidence: record.confidence,
            issues: serde_json::from_str(&record.issues).unwrap_or_default(),
            timestamp: parse_datetime(&record.timestamp),
            user_id: record.user_id,
            user_role: record.user_role,
            action_url: record.action_url,
        }
    }
}

/// Diesel-based validation event repository.
#[derive(Clone)]
pub struct DieselValidationEventRepository {
    pool: AsyncSqlitePool,
}

impl DieselValidationEventRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Open the log at `pool`, creating the table if needed.
    pub async fn open(pool: AsyncSqlitePool) -> Result<Self, DieselError> {
        let repo = Self::new(pool);
        repo.init_schema().await?;
        Ok(repo)
    }

    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(CREATE_VALIDATION_EVENTS).await
    }

    /// Insert an event and prune the log down to `capacity` rows.
    pub async fn insert(&self, event: &ValidationEvent, capacity: usize) -> Result<(), EventStoreError> {
        let issues = serde_json::to_string(&event.issues)?;
        let timestamp = event.timestamp.to_rfc3339();
        let mut conn = self.pool.get().await?;

        let new_event = NewValidationEvent {
            event_id: &event.id,
            severity: event.severity.as_str(),
            document_id: &event.document_id,
            document_type: &event.document_type,
            confidence: event.confidence,
            issues: &issues,
            timestamp: &timestamp,
            user_id: &event.user_id,
            user_role: &event.user_role,
            action_url: event.action_url.as_deref(),
        };

        diesel::insert_into(validation_events::table)
            .values(&new_event)
            .execute(&mut conn)
            .await?;

        self.prune(capacity).await?;
        Ok(())
    }

    /// Delete everything older than the newest `capacity` rows.
    async fn prune(&self, capacity: usize) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        // Row ids only grow, so the (capacity+1)-th newest id is the cutoff
        let cutoff: Option<i32> = validation_events::table
            .select(validation_events::id)
            .order(validation_events::id.desc())
            .offset(capacity as i64)
            .first(&mut conn)
            .await
            .optional()?;

        if let Some(cutoff) = cutoff {
            diesel::delete(validation_events::table.filter(validation_events::id.le(cutoff)))
                .execute(&mut conn)
                .await?;
        }

        Ok(())
    }

    /// Most recent events first.
    pub async fn get_recent(&self, limit: usize) -> Result<Vec<ValidationEvent>, DieselError> {
        let mut conn = self.pool.get().await?;

        validation_events::table
            .order(validation_events::id.desc())
            .limit(limit as i64)
            .select(ValidationEventRecord::as_select())
            .load::<ValidationEventRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(ValidationEvent::from).collect())
    }

    pub async fn count(&self) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        validation_events::table
            .select(count_star())
            .first(&mut conn)
            .await
    }

    /// All events recorded for one document, newest first.
    pub async fn get_for_document(
        &self,
        document_id: &str,
    ) -> Result<Vec<ValidationEvent>, DieselError> {
        let mut conn = self.pool.get().await?;

        validation_events::table
            .filter(validation_events::document_id.eq(document_id))
            .order(validation_events::id.desc())
            .select(ValidationEventRecord::as_select())
            .load::<ValidationEventRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(ValidationEvent::from).collect())
    }
}

#[async_trait]
impl EventStore for DieselValidationEventRepository {
    async fn append(&self, event: &ValidationEvent, capacity: usize) -> Result<(), EventStoreError> {
        self.insert(event, capacity).await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ValidationEvent>, EventStoreError> {
        Ok(self.get_recent(limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    async fn setup_test_db() -> (DieselValidationEventRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("events.db");

        let pool = AsyncSqlitePool::from_path(&db_path);
        let repo = DieselValidationEventRepository::open(pool).await.unwrap();

        (repo, dir)
    }

    fn event(severity: Severity, document_id: &str) -> ValidationEvent {
        ValidationEvent {
            id: ValidationEvent::event_id(severity, document_id),
            severity,
            document_id: document_id.to_string(),
            document_type: "form".to_string(),
            confidence: 48.5,
            issues: vec!["confidence too low".to_string(), "no meaningful content".to_string()],
            timestamp: Utc::now(),
            user_id: "u1".to_string(),
            user_role: "teacher".to_string(),
            action_url: Some("/review/1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let (repo, _dir) = setup_test_db().await;
        let original = event(Severity::Failure, "doc-1");

        repo.insert(&original, 500).await.unwrap();

        let recent = repo.get_recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        let stored = &recent[0];
        assert_eq!(stored.id, "failure-doc-1");
        assert_eq!(stored.severity, Severity::Failure);
        assert_eq!(stored.issues, original.issues);
        assert_eq!(stored.action_url.as_deref(), Some("/review/1"));
        assert_eq!(stored.timestamp.timestamp(), original.timestamp.timestamp());
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let (repo, _dir) = setup_test_db().await;

        for i in 0..6 {
            repo.insert(&event(Severity::Warning, &format!("doc-{i}")), 4)
                .await
                .unwrap();
        }

        assert_eq!(repo.count().await.unwrap(), 4);
        let ids: Vec<String> = repo
            .get_recent(10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.document_id)
            .collect();
        assert_eq!(ids, vec!["doc-5", "doc-4", "doc-3", "doc-2"]);
    }

    #[tokio::test]
    async fn test_duplicate_event_ids_are_kept() {
        let (repo, _dir) = setup_test_db().await;

        repo.insert(&event(Severity::Warning, "doc-1"), 500).await.unwrap();
        repo.insert(&event(Severity::Warning, "doc-1"), 500).await.unwrap();

        let events = repo.get_for_document("doc-1").await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.id == "warning-doc-1"));
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let (repo, dir) = setup_test_db().await;
        repo.insert(&event(Severity::Failure, "doc-1"), 500).await.unwrap();

        let pool = AsyncSqlitePool::from_path(&dir.path().join("events.db"));
        let reopened = DieselValidationEventRepository::open(pool).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unwritable_path_is_an_error() {
        let pool = AsyncSqlitePool::new("/nonexistent-dir/rollcall/events.db");
        let repo = DieselValidationEventRepository::new(pool);
        assert!(repo
            .append(&event(Severity::Failure, "doc-1"), 500)
            .await
            .is_err());
    }
}
