use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::error::{FailureKind, PipelineError, Stage};
use crate::io::RequestWorkspace;
use crate::models::AnalysisResult;
use crate::stages::{AnalysisEngine, AudioNormalizer, TranscriptionProvider};

/// Time limit for each stage
#[derive(Debug, Clone, Copy)]
pub struct StageTimeouts {
    pub normalize: Duration,
    pub transcribe: Duration,
    pub analyze: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            normalize: Duration::from_secs(60),
            transcribe: Duration::from_secs(120),
            analyze: Duration::from_secs(60),
        }
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory under which per-request scratch directories are created
    pub scratch_root: PathBuf,
    pub timeouts: StageTimeouts,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scratch_root: std::env::temp_dir(),
            timeouts: StageTimeouts::default(),
        }
    }
}

/// Lifecycle of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Normalizing,
    Transcribing,
    Analyzing,
    Completed,
    Failed(Stage),
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Received => f.write_str("received"),
            PipelineState::Normalizing => f.write_str("normalizing"),
            PipelineState::Transcribing => f.write_str("transcribing"),
            PipelineState::Analyzing => f.write_str("analyzing"),
            PipelineState::Completed => f.write_str("completed"),
            PipelineState::Failed(stage) => write!(f, "failed({})", stage),
        }
    }
}

/// Normalize → transcribe → analyze, one request at a time per call
///
/// Holds only immutable configuration and the selected provider and engine,
/// so one instance is shared across concurrent requests behind an `Arc`.
pub struct Pipeline {
    normalizer: AudioNormalizer,
    transcriber: Arc<dyn TranscriptionProvider>,
    engine: Arc<dyn AnalysisEngine>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        normalizer: AudioNormalizer,
        transcriber: Arc<dyn TranscriptionProvider>,
        engine: Arc<dyn AnalysisEngine>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            normalizer,
            transcriber,
            engine,
            config,
        }
    }

    pub fn transcriber_name(&self) -> &'static str {
        self.transcriber.name()
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn normalizer(&self) -> &AudioNormalizer {
        &self.normalizer
    }

    /// Analyze one uploaded recording
    pub async fn run(
        &self,
        audio: &[u8],
        file_name: Option<&str>,
    ) -> Result<AnalysisResult, PipelineError> {
        self.run_with_cancel(audio, file_name, &CancellationToken::new())
            .await
    }

    /// Analyze one uploaded recording, aborting when `cancel` fires
    ///
    /// All-or-nothing: either a schema-complete result or the first stage
    /// error. The request's scratch directory is gone by the time this
    /// returns, on every path.
    pub async fn run_with_cancel(
        &self,
        audio: &[u8],
        file_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, PipelineError> {
        let workspace = RequestWorkspace::create(&self.config.scratch_root).map_err(|e| {
            PipelineError::normalization(
                FailureKind::Io,
                format!("failed to create scratch directory: {}", e),
            )
        })?;

        let span = info_span!("pipeline", request_id = %workspace.id());
        let outcome = self
            .execute(&workspace, audio, file_name, cancel)
            .instrument(span)
            .await;

        workspace.close();
        outcome
    }

    async fn execute(
        &self,
        workspace: &RequestWorkspace,
        audio: &[u8],
        file_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, PipelineError> {
        let timeouts = self.config.timeouts;
        let mut state = PipelineState::Received;
        info!(bytes = audio.len(), state = %state, "Request received");

        let input = workspace.stage_upload(audio, file_name).await.map_err(|e| {
            PipelineError::normalization(FailureKind::Io, format!("failed to store upload: {}", e))
        })?;

        let normalized_path = workspace.normalized_path();
        let normalized = self
            .step(
                &mut state,
                PipelineState::Normalizing,
                Stage::Normalization,
                timeouts.normalize,
                cancel,
                self.normalizer.normalize(&input, &normalized_path),
            )
            .await?;

        let transcript = self
            .step(
                &mut state,
                PipelineState::Transcribing,
                Stage::Transcription,
                timeouts.transcribe,
                cancel,
                self.transcriber.transcribe(&normalized),
            )
            .await?;

        let result = self
            .step(
                &mut state,
                PipelineState::Analyzing,
                Stage::Analysis,
                timeouts.analyze,
                cancel,
                self.engine.analyze(&transcript, &normalized),
            )
            .await?
            .conform();

        transition(&mut state, PipelineState::Completed);
        info!(
            intent = ?result.intent,
            sentiment = ?result.sentiment,
            urgency = ?result.urgency,
            transcriber = self.transcriber.name(),
            engine = self.engine.name(),
            "Request completed"
        );
        Ok(result)
    }

    /// Run one stage under its time limit and the cancellation token
    async fn step<T>(
        &self,
        state: &mut PipelineState,
        next: PipelineState,
        stage: Stage,
        limit: Duration,
        cancel: &CancellationToken,
        work: impl Future<Output = Result<T, PipelineError>>,
    ) -> Result<T, PipelineError> {
        transition(state, next);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::new(
                stage,
                FailureKind::Cancelled,
                "request cancelled",
            )),
            finished = tokio::time::timeout(limit, work) => match finished {
                Ok(result) => result,
                Err(_) => Err(PipelineError::new(
                    stage,
                    FailureKind::Timeout,
                    format!("{} timed out after {:?}", stage, limit),
                )),
            },
        };

        if let Err(e) = &outcome {
            transition(state, PipelineState::Failed(e.stage));
            warn!(stage = %e.stage, kind = ?e.kind, error = %e.message, "Stage failed");
        }
        outcome
    }
}

fn transition(state: &mut PipelineState, next: PipelineState) {
    info!(from = %state, to = %next, "Pipeline state change");
    *state = next;
}
