//! Progress reporting for long-running extraction calls.

use std::sync::Arc;

use serde::Serialize;

/// Pipeline phase reported to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initializing,
    Cache,
    Recognizing,
    Assessing,
    Validating,
    Parsing,
    Matching,
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Cache => "cache",
            Self::Recognizing => "recognizing",
            Self::Assessing => "assessing",
            Self::Validating => "validating",
            Self::Parsing => "parsing",
            Self::Matching => "matching",
            Self::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub status: String,
    pub phase: Phase,
    /// 0-100.
    pub percent: u8,
}

/// Callback invoked at each phase transition.
pub type ProgressFn = Arc<dyn Fn(&ProgressUpdate) + Send + Sync>;

/// Invoke an optional progress callback.
pub(crate) fn report(progress: Option<&ProgressFn>, phase: Phase, percent: u8, status: &str) {
    if let Some(callback) = progress {
        callback(&ProgressUpdate {
            status: status.to_string(),
            phase,
            percent: percent.min(100),
        });
    }
}
