use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{BackendError, FailureKind, PipelineError, Stage};
use crate::models::{AudioAsset, Segment, Transcript};

/// Speech-to-text capability
///
/// Implementations map every failure to a transcription-stage
/// `PipelineError`; backend error types never cross this boundary.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Short variant name for logs and health output
    fn name(&self) -> &'static str;

    async fn transcribe(&self, audio: &AudioAsset) -> Result<Transcript, PipelineError>;
}

/// Fixed transcript for offline operation and tests
#[derive(Debug, Clone)]
pub struct MockProvider {
    transcript: Transcript,
}

impl MockProvider {
    pub const DEFAULT_TEXT: &'static str =
        "Hi, I was charged twice on my last bill and I need this fixed now. Thank you.";

    pub fn new() -> Self {
        Self::with_text(Self::DEFAULT_TEXT)
    }

    /// Canned transcript with the given text as its single segment
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let segments = if text.is_empty() {
            Vec::new()
        } else {
            vec![Segment {
                start: 0.0,
                end: 5.0,
                text: text.clone(),
            }]
        };
        Self {
            transcript: Transcript {
                text,
                language: Some("en".to_string()),
                segments,
            },
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptionProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn transcribe(&self, _audio: &AudioAsset) -> Result<Transcript, PipelineError> {
        Ok(self.transcript.clone())
    }
}

const SERVICE: &str = "Whisper API";

/// Configuration for an OpenAI-compatible transcription endpoint
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// API key (from OPENAI_API_KEY env var)
    pub api_key: String,
    /// API root including version, e.g. "https://api.openai.com/v1"
    pub base_url: String,
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl WhisperConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_MODEL: &'static str = "whisper-1";

    /// Create config from environment variables
    ///
    /// OPENAI_API_KEY is required; OPENAI_BASE_URL and WHISPER_MODEL
    /// override the defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY environment variable not set")?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("WHISPER_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Remote speech recognition through `/audio/transcriptions`
pub struct RemoteProvider {
    client: reqwest::Client,
    config: WhisperConfig,
}

impl RemoteProvider {
    pub fn new(config: WhisperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build transcription HTTP client")?;
        Ok(Self { client, config })
    }

    async fn request(&self, audio: &AudioAsset) -> Result<Transcript, BackendError> {
        let url = format!(
            "{}/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        );

        let audio_data = tokio::fs::read(audio.path()).await.map_err(|e| {
            BackendError::new(
                FailureKind::Io,
                format!("failed to read normalized audio: {}", e),
            )
        })?;

        let file_part = multipart::Part::bytes(audio_data)
            .file_name(audio.file_name())
            .mime_str("audio/wav")
            .map_err(|e| BackendError::from_reqwest(SERVICE, &e))?;

        let form = multipart::Form::new()
            .text("model", self.config.model.clone())
            .text("response_format", "verbose_json")
            .part("file", file_part);

        debug!(model = %self.config.model, "Sending audio to transcription backend");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest(SERVICE, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::from_reqwest(SERVICE, &e))?;

        if !status.is_success() {
            return Err(BackendError::from_status(SERVICE, status, body));
        }

        parse_verbose_json(&body)
    }
}

#[async_trait]
impl TranscriptionProvider for RemoteProvider {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn transcribe(&self, audio: &AudioAsset) -> Result<Transcript, PipelineError> {
        let transcript = self
            .request(audio)
            .await
            .map_err(|e| PipelineError::from_backend(Stage::Transcription, e))?;

        info!(
            chars = transcript.text.chars().count(),
            segments = transcript.segments.len(),
            language = ?transcript.language,
            "Transcription completed"
        );
        Ok(transcript)
    }
}

/// Verbose JSON body of the transcription endpoint
#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    segments: Option<Vec<VerboseSegment>>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
}

fn parse_verbose_json(body: &str) -> Result<Transcript, BackendError> {
    let parsed: VerboseTranscription = serde_json::from_str(body)
        .map_err(|e| BackendError::invalid_response(SERVICE, e, body.to_string()))?;

    let segments = parsed
        .segments
        .unwrap_or_default()
        .into_iter()
        .map(|s| Segment {
            start: s.start,
            end: s.end,
            text: s.text,
        })
        .collect();

    Ok(Transcript {
        text: parsed.text.trim().to_string(),
        language: parsed.language.filter(|l| !l.is_empty()),
        segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioEncoding;

    #[tokio::test]
    async fn test_mock_is_deterministic() {
        let provider = MockProvider::new();
        let audio = AudioAsset::new("/nonexistent/audio.wav", AudioEncoding::canonical());

        let first = provider.transcribe(&audio).await.unwrap();
        let second = provider.transcribe(&audio).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.text, MockProvider::DEFAULT_TEXT);
        assert_eq!(first.language.as_deref(), Some("en"));
        assert_eq!(first.segments.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_empty_text_has_no_segments() {
        let provider = MockProvider::with_text("");
        let audio = AudioAsset::new("/nonexistent/audio.wav", AudioEncoding::canonical());
        let transcript = provider.transcribe(&audio).await.unwrap();
        assert_eq!(transcript.text, "");
        assert!(transcript.segments.is_empty());
    }

    #[test]
    fn test_parse_verbose_json() {
        let body = r#"{
            "task": "transcribe",
            "language": "english",
            "duration": 3.2,
            "text": " Hello, I need help. ",
            "segments": [
                {"id": 0, "seek": 0, "start": 0.0, "end": 1.4, "text": " Hello,", "avg_logprob": -0.2},
                {"id": 1, "seek": 0, "start": 1.4, "end": 3.2, "text": " I need help."}
            ]
        }"#;

        let transcript = parse_verbose_json(body).unwrap();
        assert_eq!(transcript.text, "Hello, I need help.");
        assert_eq!(transcript.language.as_deref(), Some("english"));
        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.segments[1].start, 1.4);
    }

    #[test]
    fn test_parse_verbose_json_without_segments() {
        let transcript = parse_verbose_json(r#"{"text": "ok"}"#).unwrap();
        assert_eq!(transcript.text, "ok");
        assert!(transcript.segments.is_empty());
        assert!(transcript.language.is_none());
    }

    #[test]
    fn test_unparseable_body() {
        let err = parse_verbose_json("<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidResponse);
        assert_eq!(err.body.as_deref(), Some("<html>Bad Gateway</html>"));
    }
}
