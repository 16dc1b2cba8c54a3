//! End-to-end attendance pipeline tests through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rollcall::attendance::{extract_date, today, AttendanceProcessor, ParseTier};
use rollcall::cache::ExtractionCache;
use rollcall::config::{Config, EventsConfig};
use rollcall::events::EventEmitter;
use rollcall::llm::{LlmError, TextCompletion};
use rollcall::models::{AttendanceStatus, DocumentMetadata, RosterEntry, Severity};
use rollcall::ocr::{ExtractionGateway, OcrError, Recognition, Recognizer};
use rollcall::repository::{AsyncSqlitePool, DieselValidationEventRepository};

const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0\x01\x01\0\0\x01\0\x01\0\0";

struct CountingRecognizer {
    text: String,
    confidence: f64,
    calls: AtomicUsize,
}

impl CountingRecognizer {
    fn new(text: &str, confidence: f64) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            confidence,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Recognizer for CountingRecognizer {
    fn name(&self) -> &str {
        "counting"
    }

    async fn initialize(&self) -> Result<(), OcrError> {
        Ok(())
    }

    async fn recognize(&self, _image: &[u8]) -> Result<Recognition, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Recognition {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}

struct EmptyModel;

#[async_trait]
impl TextCompletion for EmptyModel {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Ok(String::new())
    }
}

fn processor(recognizer: Arc<CountingRecognizer>) -> AttendanceProcessor {
    let gateway = ExtractionGateway::new(
        recognizer,
        Arc::new(ExtractionCache::new(16)),
        EventEmitter::in_memory(&EventsConfig::default()),
    );
    AttendanceProcessor::new(Arc::new(gateway))
}

fn ahmad() -> Vec<RosterEntry> {
    vec![RosterEntry::new("s1", "001", "Ahmad")]
}

#[tokio::test]
async fn single_line_sheet_marks_student_present() {
    let outcome = processor(CountingRecognizer::new("001 Ahmad ✓", 92.0))
        .process_attendance_sheet(JPEG, &ahmad(), &DocumentMetadata::default(), None)
        .await
        .unwrap();

    assert_eq!(outcome.sheet.records.len(), 1);
    let record = &outcome.sheet.records[0];
    assert_eq!(record.student_id, "s1");
    assert_eq!(record.status, AttendanceStatus::Present);
    assert_eq!(outcome.sheet.summary.present, 1);
    assert_eq!(outcome.sheet.summary.total(), 1);
}

#[tokio::test]
async fn empty_model_reply_falls_back_to_regex() {
    let outcome = processor(CountingRecognizer::new("001 Ahmad ✓", 92.0))
        .with_completion(Arc::new(EmptyModel))
        .process_attendance_sheet(JPEG, &ahmad(), &DocumentMetadata::default(), None)
        .await
        .unwrap();

    assert_eq!(outcome.tier, ParseTier::Regex);
    assert_eq!(outcome.sheet.summary.total(), outcome.sheet.records.len());
}

#[tokio::test]
async fn identical_upload_hits_cache_but_still_emits_events() {
    let recognizer = CountingRecognizer::new("001 Ahmad ✓", 45.0);
    let processor = processor(Arc::clone(&recognizer));
    let mut events = processor.gateway().events().subscribe();
    let metadata = DocumentMetadata::default()
        .with_document_id("sheet-7a")
        .with_user("u1", "teacher");

    let first = processor
        .process_attendance_sheet(JPEG, &ahmad(), &metadata, None)
        .await
        .unwrap();
    let second = processor
        .process_attendance_sheet(JPEG, &ahmad(), &metadata, None)
        .await
        .unwrap();

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 1);

    for _ in 0..2 {
        let event = events.recv().await.unwrap();
        assert_eq!(event.id, "failure-sheet-7a");
        assert_eq!(event.severity, Severity::Failure);
        assert_eq!(event.user_role, "teacher");
    }
    assert_eq!(processor.gateway().cache_stats().hits, 1);
}

#[tokio::test]
async fn low_confidence_and_empty_text_yield_empty_sheets() {
    for (text, confidence) in [("001 Ahmad ✓", 20.0), ("", 95.0), ("   \n ", 95.0)] {
        let outcome = processor(CountingRecognizer::new(text, confidence))
            .process_attendance_sheet(JPEG, &ahmad(), &DocumentMetadata::default(), None)
            .await
            .unwrap();

        assert!(outcome.sheet.records.is_empty());
        assert_eq!(outcome.sheet.summary.total(), 0);
        assert_eq!(outcome.tier, ParseTier::Skipped);
    }
}

#[tokio::test]
async fn registration_number_outranks_name() {
    let roster = vec![
        RosterEntry::new("s1", "001", "Ahmad"),
        RosterEntry::new("s2", "002", "Ahmad Fauzi"),
    ];
    let outcome = processor(CountingRecognizer::new("002 Ahmad hadir", 90.0))
        .process_attendance_sheet(JPEG, &roster, &DocumentMetadata::default(), None)
        .await
        .unwrap();

    assert_eq!(outcome.sheet.records.len(), 1);
    assert_eq!(outcome.sheet.records[0].student_id, "s2");
    assert!((0.0..=100.0).contains(&outcome.sheet.records[0].confidence));
}

#[tokio::test]
async fn sheet_date_comes_from_text() {
    let text = "DAFTAR HADIR\nTanggal: 30 Januari 2026\n001 Ahmad ✓";
    let outcome = processor(CountingRecognizer::new(text, 90.0))
        .process_attendance_sheet(JPEG, &ahmad(), &DocumentMetadata::default(), None)
        .await
        .unwrap();

    assert_eq!(outcome.sheet.date, "2026-01-30");
    assert_eq!(extract_date("30-01-2026", today()), "2026-01-30");
    assert_eq!(
        extract_date("tanpa tanggal", today()),
        today().format("%Y-%m-%d").to_string()
    );
}

#[tokio::test]
async fn events_persist_to_sqlite_log() {
    let dir = tempfile::tempdir().unwrap();
    let pool = AsyncSqlitePool::from_path(&dir.path().join("events.db"));
    let repo = DieselValidationEventRepository::open(pool).await.unwrap();

    let config = Config {
        events: EventsConfig {
            capacity: 2,
            ..EventsConfig::default()
        },
        ..Config::default()
    };
    let emitter = EventEmitter::new(Arc::new(repo.clone()), &config.events);
    let gateway = ExtractionGateway::from_config(
        &config,
        CountingRecognizer::new("buram", 30.0),
        emitter,
    );
    let processor = AttendanceProcessor::from_config(&config, Arc::new(gateway));

    for id in ["a", "b", "c"] {
        processor
            .process_attendance_sheet(
                JPEG,
                &ahmad(),
                &DocumentMetadata::default().with_document_id(id),
                None,
            )
            .await
            .unwrap();
    }

    let stored: Vec<String> = repo
        .get_recent(10)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.document_id)
        .collect();
    assert_eq!(stored, vec!["c", "b"]);
}
