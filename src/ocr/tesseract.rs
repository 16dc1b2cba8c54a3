//! Tesseract OCR backend implementation.
//!
//! Runs the Tesseract CLI in TSV mode so that per-word confidences are
//! available. Text is rebuilt line by line from the word rows and the
//! reported confidence is the mean over recognized words.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::backend::{OcrError, Recognition, Recognizer};
use crate::config::OcrSettings;

/// Tesseract OCR backend.
pub struct TesseractBackend {
    settings: OcrSettings,
}

impl TesseractBackend {
    /// Create a new Tesseract backend with default settings.
    pub fn new() -> Self {
        Self {
            settings: OcrSettings::default(),
        }
    }

    /// Create a new Tesseract backend with custom settings.
    pub fn with_settings(settings: OcrSettings) -> Self {
        Self { settings }
    }

    async fn run_tesseract(&self, image_path: &std::path::Path) -> Result<String, OcrError> {
        let output = Command::new(&self.settings.binary)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.settings.language])
            .arg("tsv")
            .output()
            .await;

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::RecognitionFailed(format!(
                        "tesseract failed: {}",
                        stderr.trim()
                    )))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable("tesseract not found (install tesseract-ocr)".into()),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Recognizer for TesseractBackend {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn initialize(&self) -> Result<(), OcrError> {
        let path = which::which(&self.settings.binary).map_err(|_| {
            OcrError::RecognizerInit(format!(
                "{} not installed. Install with: apt install tesseract-ocr",
                self.settings.binary
            ))
        })?;
        debug!("Using tesseract at {}", path.display());
        Ok(())
    }

    async fn recognize(&self, image: &[u8]) -> Result<Recognition, OcrError> {
        let file = tempfile::Builder::new().prefix("rollcall-").tempfile()?;
        tokio::fs::write(file.path(), image).await?;

        let tsv = self.run_tesseract(file.path()).await?;
        Ok(parse_tsv(&tsv))
    }
}

/// Rebuild text and mean word confidence from Tesseract TSV output.
pub fn parse_tsv(tsv: &str) -> Recognition {
    let mut lines: Vec<String> = Vec::new();
    let mut current_line: Option<(u32, u32, u32, u32)> = None;
    let mut confidence_sum = 0.0;
    let mut word_count = 0usize;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let text = cols[11].trim();
        let conf: f64 = cols[10].trim().parse().unwrap_or(-1.0);
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let line_id = (
            cols[1].parse().unwrap_or(0),
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        match lines.last_mut() {
            Some(line) if current_line == Some(line_id) => {
                line.push(' ');
                line.push_str(text);
            }
            _ => {
                lines.push(text.to_string());
                current_line = Some(line_id);
            }
        }

        confidence_sum += conf;
        word_count += 1;
    }

    let confidence = if word_count == 0 {
        0.0
    } else {
        (confidence_sum / word_count as f64).clamp(0.0, 100.0)
    };

    Recognition {
        text: lines.join("\n"),
        confidence,
    }
}
