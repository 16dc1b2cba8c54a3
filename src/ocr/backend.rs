//! Recognizer abstraction.
//!
//! The recognition engine is a black box that turns image bytes into text
//! plus a 0-100 confidence. Backends are initialized once and reused; the
//! gateway owns their lifecycle.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from recognizer backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("Recognizer initialization failed: {0}")]
    RecognizerInit(String),

    #[error("OCR failed: {0}")]
    RecognitionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw recognizer output.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub text: String,
    /// 0-100.
    pub confidence: f64,
}

/// A text recognition engine.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Prepare the engine. Called once before the first `recognize`.
    async fn initialize(&self) -> Result<(), OcrError>;

    /// Extract text from image bytes.
    async fn recognize(&self, image: &[u8]) -> Result<Recognition, OcrError>;

    /// Release engine resources. The engine may be initialized again later.
    async fn terminate(&self) {}
}
