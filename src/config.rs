//! Configuration management for rollcall using the prefer crate.
//!
//! `prefer` discovers `rollcall.{toml,yaml,json,...}` in the usual places;
//! the discovered file is then parsed with serde according to its extension.
//! Every field has a default, so a missing file yields a working config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::llm::LlmConfig;

/// Recognizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Tesseract language codes (e.g. "ind+eng").
    #[serde(default = "default_language")]
    pub language: String,
    /// Tesseract executable name or path.
    #[serde(default = "default_binary")]
    pub binary: String,
}

fn default_language() -> String {
    "ind+eng".to_string()
}

fn default_binary() -> String {
    "tesseract".to_string()
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: default_language(),
            binary: default_binary(),
        }
    }
}

/// Extraction cache bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    /// Entries older than this are treated as misses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
}

fn default_cache_capacity() -> usize {
    256
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: None,
        }
    }
}

/// Confidence thresholds for the text quality assessor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f64,
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f64,
}

fn default_high_threshold() -> f64 {
    80.0
}

fn default_medium_threshold() -> f64 {
    60.0
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            high_threshold: default_high_threshold(),
            medium_threshold: default_medium_threshold(),
        }
    }
}

/// Thresholds for the validation engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Below this the extraction is a failure.
    #[serde(default = "default_failure_confidence")]
    pub failure_confidence: f64,
    /// Below this the extraction is a warning.
    #[serde(default = "default_warning_confidence")]
    pub warning_confidence: f64,
    #[serde(default = "default_min_word_count")]
    pub min_word_count: usize,
    /// Mean per-record confidence expected on an attendance sheet.
    #[serde(default = "default_attendance_confidence")]
    pub attendance_confidence: f64,
}

fn default_failure_confidence() -> f64 {
    50.0
}

fn default_warning_confidence() -> f64 {
    70.0
}

fn default_min_word_count() -> usize {
    20
}

fn default_attendance_confidence() -> f64 {
    75.0
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            failure_confidence: default_failure_confidence(),
            warning_confidence: default_warning_confidence(),
            min_word_count: default_min_word_count(),
            attendance_confidence: default_attendance_confidence(),
        }
    }
}

/// Validation event log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Maximum events retained in the persisted log.
    #[serde(default = "default_events_capacity")]
    pub capacity: usize,
    /// In-process broadcast buffer per subscriber.
    #[serde(default = "default_broadcast_buffer")]
    pub broadcast_buffer: usize,
    /// SQLite database for the event log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

fn default_events_capacity() -> usize {
    500
}

fn default_broadcast_buffer() -> usize {
    64
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_events_capacity(),
            broadcast_buffer: default_broadcast_buffer(),
            database: None,
        }
    }
}

impl EventsConfig {
    /// Configured database path, or `<data dir>/rollcall/events.db`.
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
                .join("rollcall")
                .join("events.db")
        })
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ocr: OcrSettings,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    /// File this config was read from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover and load the config file, falling back to defaults.
    pub async fn load() -> Self {
        match prefer::load("rollcall").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}; using defaults", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load config from a specific file.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }
}
