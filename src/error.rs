use std::fmt;

use serde::Serialize;

/// Pipeline stage a failure originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Normalization,
    Transcription,
    Analysis,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Normalization => "normalization",
            Stage::Transcription => "transcription",
            Stage::Analysis => "analysis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a failure cause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Conversion tool missing or not executable
    ToolUnavailable,
    /// Conversion tool ran but could not produce output
    ConversionFailed,
    /// Stage exceeded its time limit
    Timeout,
    /// Backend could not be reached or answered with a server error
    Unreachable,
    /// Backend rejected our credentials
    Unauthorized,
    /// Backend quota or rate limit hit
    RateLimited,
    /// Backend answered with something we could not parse
    InvalidResponse,
    /// Local filesystem failure
    Io,
    /// Caller aborted the request
    Cancelled,
}

impl FailureKind {
    /// Whether resubmitting the same audio may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FailureKind::ToolUnavailable
            | FailureKind::ConversionFailed
            | FailureKind::Unauthorized => false,
            FailureKind::Timeout
            | FailureKind::Unreachable
            | FailureKind::RateLimited
            | FailureKind::InvalidResponse
            | FailureKind::Io
            | FailureKind::Cancelled => true,
        }
    }
}

/// Stage-tagged error surfaced by the pipeline
#[derive(Debug, Clone, thiserror::Error)]
#[error("{stage} failed: {message}")]
pub struct PipelineError {
    pub stage: Stage,
    pub kind: FailureKind,
    pub message: String,
}

impl PipelineError {
    pub fn new(stage: Stage, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }

    pub fn normalization(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::new(Stage::Normalization, kind, message)
    }

    pub fn transcription(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::new(Stage::Transcription, kind, message)
    }

    pub fn analysis(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::new(Stage::Analysis, kind, message)
    }

    /// Tag a backend failure with the stage that made the call
    pub fn from_backend(stage: Stage, err: BackendError) -> Self {
        Self::new(stage, err.kind, err.message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Failure talking to a remote HTTP backend, before it is tagged with a stage
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
    /// Verbatim response body, when one was received
    pub body: Option<String>,
}

impl BackendError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            body: None,
        }
    }

    /// Classify a transport-level reqwest failure
    pub fn from_reqwest(service: &str, err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_decode() {
            FailureKind::InvalidResponse
        } else {
            FailureKind::Unreachable
        };
        Self::new(kind, format!("{} request failed: {}", service, err))
    }

    /// Classify a non-success HTTP status
    pub fn from_status(service: &str, status: reqwest::StatusCode, body: String) -> Self {
        let kind = match status.as_u16() {
            401 | 403 => FailureKind::Unauthorized,
            429 => FailureKind::RateLimited,
            408 | 504 => FailureKind::Timeout,
            _ => FailureKind::Unreachable,
        };
        Self {
            kind,
            message: format!("{} error: {} - {}", service, status, truncate_body(&body)),
            body: Some(body),
        }
    }

    /// A response arrived but could not be understood
    pub fn invalid_response(service: &str, detail: impl fmt::Display, body: String) -> Self {
        Self {
            kind: FailureKind::InvalidResponse,
            message: format!("{} returned an unparseable response: {}", service, detail),
            body: Some(body),
        }
    }
}

/// Keep backend error bodies short enough for a log line or an error message
fn truncate_body(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX_CHARS).collect();
        format!("{}…", head)
    }
}
