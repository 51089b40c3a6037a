use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{FailureKind, PipelineError, Stage};
use crate::heuristics::{apply_heuristics, HeuristicsConfig};
use crate::llm::{build_analysis_prompt, parse_analysis_response, AnthropicClient, SYSTEM_PROMPT};
use crate::models::{AnalysisResult, AudioAsset, AudioCues, Transcript};

/// Transcript understanding capability
///
/// `audio` is the normalized recording. Current engines only use timing
/// derived from transcript segments; the handle is there for engines that
/// want to look at the signal itself.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Short variant name for logs and health output
    fn name(&self) -> &'static str;

    async fn analyze(
        &self,
        transcript: &Transcript,
        audio: &AudioAsset,
    ) -> Result<AnalysisResult, PipelineError>;
}

/// Rule-based engine, deterministic and infallible
#[derive(Debug, Clone, Default)]
pub struct HeuristicEngine {
    config: HeuristicsConfig,
}

impl HeuristicEngine {
    pub fn new(config: HeuristicsConfig) -> Self {
        Self { config }
    }

    /// Synchronous entry point, usable without an audio handle
    pub fn analyze_text(&self, text: &str) -> AnalysisResult {
        apply_heuristics(text, &self.config)
    }
}

#[async_trait]
impl AnalysisEngine for HeuristicEngine {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn analyze(
        &self,
        transcript: &Transcript,
        _audio: &AudioAsset,
    ) -> Result<AnalysisResult, PipelineError> {
        Ok(self.analyze_text(&transcript.text))
    }
}

/// Engine backed by a hosted language model
///
/// Replies that do not match the JSON contract are recovered locally: the
/// result is filled with neutral defaults and the reply kept in
/// `raw_response`. Only transport, auth and quota failures are surfaced.
pub struct RemoteEngine {
    client: AnthropicClient,
}

impl RemoteEngine {
    pub fn new(client: AnthropicClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnalysisEngine for RemoteEngine {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn analyze(
        &self,
        transcript: &Transcript,
        _audio: &AudioAsset,
    ) -> Result<AnalysisResult, PipelineError> {
        let cues = AudioCues::from_transcript(transcript);
        let prompt = build_analysis_prompt(transcript, cues.as_ref());

        let reply = match self.client.send_message(SYSTEM_PROMPT, &prompt).await {
            Ok(text) => text,
            Err(e) if e.kind == FailureKind::InvalidResponse => {
                warn!(error = %e, "Analysis backend reply unreadable, falling back to defaults");
                e.body.unwrap_or(e.message)
            }
            Err(e) => return Err(PipelineError::from_backend(Stage::Analysis, e)),
        };

        let validation = parse_analysis_response(&reply, transcript);
        if validation.is_clean() {
            info!(model = %self.client.model(), "Analysis completed");
        } else {
            warn!(
                model = %self.client.model(),
                issues = ?validation.issues,
                "Analysis reply did not match the contract, defaults applied"
            );
        }

        Ok(validation.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AudioEncoding, Intent, Sentiment, Tone, Urgency};

    fn audio() -> AudioAsset {
        AudioAsset::new("/nonexistent/normalized.wav", AudioEncoding::canonical())
    }

    #[tokio::test]
    async fn test_heuristic_engine_ignores_audio() {
        let engine = HeuristicEngine::default();
        let transcript =
            Transcript::from_text("I want to cancel my subscription. I am not happy with the service.");

        let result = engine.analyze(&transcript, &audio()).await.unwrap();
        assert_eq!(result.intent, Intent::CancelSubscription);
        assert_eq!(result.sentiment, Sentiment::Negative);
        assert_eq!(result.tone, Tone::Frustrated);
        assert_eq!(result.urgency, Urgency::Low);
    }

    #[tokio::test]
    async fn test_heuristic_engine_matches_sync_path() {
        let engine = HeuristicEngine::default();
        let transcript = Transcript::from_text("Please help asap, my bill is wrong");
        let async_result = engine.analyze(&transcript, &audio()).await.unwrap();
        assert_eq!(async_result, engine.analyze_text(&transcript.text));
    }

    #[tokio::test]
    async fn test_remote_engine_unreachable_backend_is_surfaced() {
        // Nothing listens on port 9 of localhost in the test environment
        let mut config = crate::llm::AnthropicConfig::new("test-key".to_string());
        config.base_url = "http://127.0.0.1:9".to_string();
        config.timeout = std::time::Duration::from_secs(5);
        let engine = RemoteEngine::new(AnthropicClient::new(config).unwrap());

        let err = engine
            .analyze(&Transcript::from_text("hello"), &audio())
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::Analysis);
        assert!(matches!(
            err.kind,
            FailureKind::Unreachable | FailureKind::Timeout
        ));
    }
}
