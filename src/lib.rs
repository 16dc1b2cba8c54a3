//! Rollcall - attendance sheet OCR and roster matching.
//!
//! Photographed attendance sheets and similar school forms are turned into
//! roster-matched records. Extractions are cached by content, assessed for
//! quality, validated, and low-confidence results are emitted as review
//! events for a notification consumer.

pub mod attendance;
pub mod cache;
pub mod config;
pub mod events;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod repository;
pub mod schema;
pub mod validation;

pub use attendance::{AttendanceOutcome, AttendanceProcessor, ParseTier};
pub use cache::{CacheStats, ExtractionCache, ResultCache};
pub use config::Config;
pub use events::{EventEmitter, EventStore, EventStoreError, MemoryEventStore};
pub use ocr::{Extraction, ExtractionError, ExtractionGateway, Recognizer, TesseractBackend};
