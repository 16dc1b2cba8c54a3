//! Extraction gateway.
//!
//! Owns the recognizer lifecycle and runs the per-document pipeline:
//! format check, cache lookup, recognition on a miss, quality assessment,
//! field extraction, then validation and event emission on every call.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::backend::{OcrError, Recognizer};
use super::fields::extract_fields;
use super::quality::TextQualityAssessor;
use crate::cache::{cache_key, CacheStats, ExtractionCache, ResultCache};
use crate::config::Config;
use crate::events::EventEmitter;
use crate::models::{report, DocumentMetadata, ExtractionResult, Phase, ProgressFn, ValidationEvent};
use crate::validation::{ExtractionValidation, ExtractionValidator};

/// Length of the key prefix used as a document id when none is supplied.
const DOCUMENT_ID_LEN: usize = 16;

/// The single error surfaced to extraction callers.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction failed: {0}")]
    RecognizerInit(#[source] OcrError),

    #[error("extraction failed: {0}")]
    Recognition(#[source] OcrError),

    #[error("extraction failed: unsupported file format ({0})")]
    UnsupportedFormat(String),
}

/// Everything one extraction call produced.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub result: Arc<ExtractionResult>,
    pub validation: ExtractionValidation,
    /// The event emitted for this call, if validation found issues.
    pub event: Option<ValidationEvent>,
    pub document_id: String,
    pub cache_hit: bool,
}

/// Init-once wrapper around a recognizer, composed with cache, assessor,
/// validator and event emitter.
pub struct ExtractionGateway {
    recognizer: Arc<dyn Recognizer>,
    initialized: Mutex<bool>,
    cache: Arc<dyn ResultCache>,
    assessor: TextQualityAssessor,
    validator: ExtractionValidator,
    events: EventEmitter,
}

impl ExtractionGateway {
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        cache: Arc<dyn ResultCache>,
        events: EventEmitter,
    ) -> Self {
        Self {
            recognizer,
            initialized: Mutex::new(false),
            cache,
            assessor: TextQualityAssessor::default(),
            validator: ExtractionValidator::default(),
            events,
        }
    }

    /// Build a gateway with cache and thresholds taken from `config`.
    pub fn from_config(config: &Config, recognizer: Arc<dyn Recognizer>, events: EventEmitter) -> Self {
        let cache: Arc<dyn ResultCache> = match config.cache.ttl_secs {
            Some(secs) => Arc::new(ExtractionCache::with_ttl(
                config.cache.capacity,
                std::time::Duration::from_secs(secs),
            )),
            None => Arc::new(ExtractionCache::new(config.cache.capacity)),
        };
        Self {
            assessor: TextQualityAssessor::new(config.quality),
            validator: ExtractionValidator::new(config.validation),
            ..Self::new(recognizer, cache, events)
        }
    }

    /// Initialize the recognizer if it is not already.
    pub async fn initialize(&self) -> Result<(), ExtractionError> {
        let mut initialized = self.initialized.lock().await;
        if *initialized {
            return Ok(());
        }
        info!("Initializing {} recognizer", self.recognizer.name());
        self.recognizer
            .initialize()
            .await
            .map_err(ExtractionError::RecognizerInit)?;
        *initialized = true;
        Ok(())
    }

    /// Release the recognizer. The next extraction initializes it again.
    pub async fn terminate(&self) {
        let mut initialized = self.initialized.lock().await;
        if *initialized {
            info!("Terminating {} recognizer", self.recognizer.name());
            self.recognizer.terminate().await;
            *initialized = false;
        }
    }

    pub async fn is_initialized(&self) -> bool {
        *self.initialized.lock().await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    /// Extract text and quality signals from image bytes.
    pub async fn extract(
        &self,
        content: &[u8],
        metadata: &DocumentMetadata,
        progress: Option<&ProgressFn>,
    ) -> Result<Extraction, ExtractionError> {
        report(progress, Phase::Initializing, 0, "Checking document");
        let mime_type = sniff_image(content)?;

        report(progress, Phase::Cache, 10, "Looking up cache");
        let key = cache_key(content, mime_type, metadata);
        let document_id = metadata
            .document_id
            .clone()
            .unwrap_or_else(|| key.chars().take(DOCUMENT_ID_LEN).collect());

        let (result, cache_hit) = match self.cache.get(&key) {
            Some(cached) => {
                debug!("Cache hit for document {}", document_id);
                (cached, true)
            }
            None => {
                debug!("Cache miss for document {}", document_id);
                let result = Arc::new(self.recognize(content, progress).await?);
                self.cache.set(key, Arc::clone(&result));
                (result, false)
            }
        };

        report(progress, Phase::Validating, 80, "Validating extraction");
        let validation = self.validator.validate(&result);
        let event = self
            .events
            .record(&validation, &result, metadata, &document_id)
            .await;

        report(progress, Phase::Complete, 100, "Extraction complete");
        Ok(Extraction {
            result,
            validation,
            event,
            document_id,
            cache_hit,
        })
    }

    async fn recognize(
        &self,
        content: &[u8],
        progress: Option<&ProgressFn>,
    ) -> Result<ExtractionResult, ExtractionError> {
        self.initialize().await?;

        report(progress, Phase::Recognizing, 20, "Recognizing text");
        let recognition = self
            .recognizer
            .recognize(content)
            .await
            .map_err(ExtractionError::Recognition)?;
        debug!(
            "Recognized {} chars at {:.1}% confidence",
            recognition.text.len(),
            recognition.confidence
        );

        report(progress, Phase::Assessing, 60, "Assessing text quality");
        let confidence = recognition.confidence.clamp(0.0, 100.0);
        let quality = self.assessor.assess(&recognition.text, confidence);
        let fields = extract_fields(&recognition.text);

        Ok(ExtractionResult {
            text: recognition.text,
            confidence,
            quality,
            fields,
        })
    }
}

/// MIME type of `content` if it is an image.
fn sniff_image(content: &[u8]) -> Result<&'static str, ExtractionError> {
    match infer::get(content) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(kind.mime_type()),
        Some(kind) => Err(ExtractionError::UnsupportedFormat(kind.mime_type().to_string())),
        None => Err(ExtractionError::UnsupportedFormat("unknown".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventsConfig;
    use crate::models::{ProgressUpdate, Severity};
    use crate::ocr::Recognition;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x02\0\0\0";

    struct FakeRecognizer {
        text: String,
        confidence: f64,
        inits: AtomicUsize,
        calls: AtomicUsize,
        fail_init: bool,
    }

    impl FakeRecognizer {
        fn new(text: &str, confidence: f64) -> Self {
            Self {
                text: text.to_string(),
                confidence,
                inits: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
                fail_init: false,
            }
        }
    }

    #[async_trait]
    impl Recognizer for FakeRecognizer {
        fn name(&self) -> &str {
            "fake"
        }

        async fn initialize(&self) -> Result<(), OcrError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                return Err(OcrError::RecognizerInit("no model".to_string()));
            }
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

    struct BrokenRecognizer;

    #[async_trait]
    impl Recognizer for BrokenRecognizer {
        fn name(&self) -> &str {
            "broken"
        }

        async fn initialize(&self) -> Result<(), OcrError> {
            Ok(())
        }

        async fn recognize(&self, _image: &[u8]) -> Result<Recognition, OcrError> {
            Err(OcrError::RecognitionFailed("segfault".to_string()))
        }
    }

    fn gateway(recognizer: Arc<dyn Recognizer>) -> ExtractionGateway {
        ExtractionGateway::new(
            recognizer,
            Arc::new(ExtractionCache::new(8)),
            EventEmitter::in_memory(&EventsConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_lazy_init_once() {
        let fake = Arc::new(FakeRecognizer::new("001 Ahmad hadir", 90.0));
        let gw = gateway(fake.clone());
        assert!(!gw.is_initialized().await);

        gw.extract(PNG, &DocumentMetadata::default(), None).await.unwrap();
        gw.extract(b"\x89PNG\r\n\x1a\nother", &DocumentMetadata::default(), None)
            .await
            .unwrap();

        assert!(gw.is_initialized().await);
        assert_eq!(fake.inits.load(Ordering::SeqCst), 1);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 2);

        gw.terminate().await;
        assert!(!gw.is_initialized().await);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_recognizer_but_emits_events() {
        let fake = Arc::new(FakeRecognizer::new("buram", 40.0));
        let gw = gateway(fake.clone());
        let metadata = DocumentMetadata::default().with_document_id("doc-1");

        let first = gw.extract(PNG, &metadata, None).await.unwrap();
        let second = gw.extract(PNG, &metadata, None).await.unwrap();

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.result, second.result);

        let events = gw.events().recent(10).await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.id == "failure-doc-1"));
        assert_eq!(gw.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_different_metadata_misses_cache() {
        let fake = Arc::new(FakeRecognizer::new("teks", 90.0));
        let gw = gateway(fake.clone());

        gw.extract(PNG, &DocumentMetadata::default().with_user("u1", "teacher"), None)
            .await
            .unwrap();
        gw.extract(PNG, &DocumentMetadata::default().with_user("u2", "teacher"), None)
            .await
            .unwrap();

        assert_eq!(fake.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_image_rejected_before_recognizer() {
        let fake = Arc::new(FakeRecognizer::new("x", 90.0));
        let gw = gateway(fake.clone());

        let err = gw
            .extract(b"%PDF-1.7\n...", &DocumentMetadata::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(ref m) if m == "application/pdf"));
        assert!(err.to_string().starts_with("extraction failed"));

        let err = gw
            .extract(b"plain words", &DocumentMetadata::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
        assert_eq!(fake.inits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_init_failure_surfaces() {
        let fake = Arc::new(FakeRecognizer {
            fail_init: true,
            ..FakeRecognizer::new("x", 90.0)
        });
        let gw = gateway(fake);
        let err = gw.extract(PNG, &DocumentMetadata::default(), None).await.unwrap_err();
        assert!(matches!(err, ExtractionError::RecognizerInit(_)));
        assert!(!gw.is_initialized().await);
    }

    #[tokio::test]
    async fn test_recognition_failure_keeps_cause() {
        let gw = gateway(Arc::new(BrokenRecognizer));
        let err = gw.extract(PNG, &DocumentMetadata::default(), None).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Recognition(_)));
        let source = std::error::Error::source(&err).unwrap().to_string();
        assert!(source.contains("segfault"));
        assert_eq!(gw.cache_stats().size, 0);
    }

    #[tokio::test]
    async fn test_clean_extraction_emits_nothing() {
        let text = "DAFTAR HADIR SISWA kelas tujuh ".repeat(6);
        let gw = gateway(Arc::new(FakeRecognizer::new(&text, 95.0)));
        let extraction = gw.extract(PNG, &DocumentMetadata::default(), None).await.unwrap();

        assert_eq!(extraction.validation.severity, Severity::Success);
        assert!(extraction.event.is_none());
        assert!(gw.events().recent(10).await.unwrap().is_empty());
        assert_eq!(extraction.document_id.len(), DOCUMENT_ID_LEN);
    }

    #[tokio::test]
    async fn test_progress_phases_in_order() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: ProgressFn = Arc::new(move |update: &ProgressUpdate| {
            sink.lock().unwrap().push((update.phase, update.percent));
        });

        let gw = gateway(Arc::new(FakeRecognizer::new("teks", 90.0)));
        gw.extract(PNG, &DocumentMetadata::default(), Some(&progress))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        let phases: Vec<Phase> = seen.iter().map(|(p, _)| *p).collect();
        assert_eq!(
            phases,
            vec![
                Phase::Initializing,
                Phase::Cache,
                Phase::Recognizing,
                Phase::Assessing,
                Phase::Validating,
                Phase::Complete
            ]
        );
        assert!(seen.windows(2).all(|w| w[0].1 <= w[1].1));
    }
}
