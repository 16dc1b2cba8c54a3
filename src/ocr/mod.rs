//! OCR and text extraction module.
//!
//! Recognition is delegated to a [`Recognizer`] backend. Tesseract is the
//! default backend. The [`ExtractionGateway`] wraps a backend with caching,
//! quality assessment, validation and event emission.

mod backend;
mod fields;
mod gateway;
mod quality;
mod tesseract;

pub use backend::{OcrError, Recognition, Recognizer};
pub use fields::extract_fields;
pub use gateway::{Extraction, ExtractionError, ExtractionGateway};
pub use quality::{classify_document, TextQualityAssessor};
pub use tesseract::{parse_tsv, TesseractBackend};
