//! Error types for the export heist.

use serde::Serialize;
use thiserror::Error;

/// Diagnostic fragments the target application shows when it flags automation.
const BOT_DETECTION_MARKERS: &[&str] = &["Bot detection", "Oops... an error has occurred"];

#[derive(Error, Debug)]
pub enum Error {
    /// The scripting call itself failed (non-zero exit, script error).
    #[error("Bridge execution error: {0}")]
    Bridge(String),

    #[error("Not logged in to Expensify. Please run the login tool first.")]
    NotAuthenticated,

    #[error("Page did not load within {attempts} readiness checks")]
    PageNotReady { attempts: u32 },

    #[error("{step}: {diagnostic}")]
    ElementNotFound {
        step: &'static str,
        diagnostic: String,
    },

    #[error("No CSV export found within {timeout_secs}s. Please try again.")]
    ExportNotFound { timeout_secs: u64 },

    /// A finished attempt's state was handed back to the orchestrator.
    #[error("Export attempt already finished ({phase})")]
    AttemptFinished { phase: &'static str },

    #[error("Malformed CSV input: {0}")]
    MalformedInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// User-facing error buckets reported at the tool boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    Timeout,
    BotDetection,
    Generic,
}

impl ErrorCategory {
    /// Short label used as the `error` field of a structured error.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Authentication => "Not logged in",
            Self::Timeout => "Timeout",
            Self::BotDetection => "Bot detection triggered",
            Self::Generic => "Export failed",
        }
    }
}

impl Error {
    /// Classify this error for the tool boundary.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotAuthenticated => ErrorCategory::Authentication,
            Self::PageNotReady { .. } | Self::ExportNotFound { .. } => ErrorCategory::Timeout,
            Self::Bridge(diagnostic) if is_bot_detection(diagnostic) => ErrorCategory::BotDetection,
            _ => ErrorCategory::Generic,
        }
    }

    /// Remediation hint shown to the caller instead of the raw diagnostic.
    pub fn remediation(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Authentication => "Please run expensify_login first to authenticate.",
            ErrorCategory::Timeout => {
                "The operation timed out. The page may be loading slowly or the UI may have changed."
            }
            ErrorCategory::BotDetection => {
                "Expensify may have detected automation. Wait a few minutes, sign in manually in Safari, then retry."
            }
            ErrorCategory::Generic => match self {
                Self::ElementNotFound { .. } => {
                    "The Expensify page layout did not match what the export expects. It may have changed."
                }
                Self::Bridge(_) => {
                    "Safari could not be scripted. Check that Safari is running and 'Allow JavaScript from Apple Events' is enabled."
                }
                Self::AttemptFinished { .. } => "Start a new export attempt.",
                _ => "Please try again.",
            },
        }
    }
}

fn is_bot_detection(diagnostic: &str) -> bool {
    BOT_DETECTION_MARKERS.iter().any(|m| diagnostic.contains(m))
}
