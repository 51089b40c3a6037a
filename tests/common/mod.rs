#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use call_analyzer::{
    AnalysisEngine, AnalysisResult, AudioAsset, AudioNormalizer, FailureKind, HeuristicEngine,
    MockProvider, NormalizerConfig, Pipeline, PipelineConfig, PipelineError, StageTimeouts,
    Transcript, TranscriptionProvider,
};

/// Writes the output file named by the last argument, like a successful conversion
pub const CONVERTING_TOOL: &str = "for last; do :; done\nprintf 'RIFF' > \"$last\"";

/// Fails the way a conversion tool does on unreadable input
pub const REJECTING_TOOL: &str = "echo 'Invalid data found when processing input' >&2\nexit 1";

/// Never finishes within a test's patience
pub const HANGING_TOOL: &str = "exec sleep 30";

/// Write an executable shell script standing in for the conversion tool
#[cfg(unix)]
pub fn fake_tool(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-ffmpeg");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn timeouts(normalize: Duration) -> StageTimeouts {
    StageTimeouts {
        normalize,
        ..StageTimeouts::default()
    }
}

pub fn pipeline_with(
    tool: PathBuf,
    scratch_root: &Path,
    transcriber: Arc<dyn TranscriptionProvider>,
    engine: Arc<dyn AnalysisEngine>,
    timeouts: StageTimeouts,
) -> Pipeline {
    Pipeline::new(
        AudioNormalizer::new(NormalizerConfig {
            tool,
            ..Default::default()
        }),
        transcriber,
        engine,
        PipelineConfig {
            scratch_root: scratch_root.to_path_buf(),
            timeouts,
        },
    )
}

/// Mock transcription with heuristic analysis
pub fn offline_pipeline(tool: PathBuf, scratch_root: &Path) -> Pipeline {
    pipeline_with(
        tool,
        scratch_root,
        Arc::new(MockProvider::new()),
        Arc::new(HeuristicEngine::default()),
        StageTimeouts::default(),
    )
}

/// Number of entries left under a scratch root
pub fn residue(scratch_root: &Path) -> usize {
    std::fs::read_dir(scratch_root).unwrap().count()
}

/// Transcription backend that always fails with `kind`
pub struct FailingTranscriber(pub FailureKind);

#[async_trait]
impl TranscriptionProvider for FailingTranscriber {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn transcribe(&self, _audio: &AudioAsset) -> Result<Transcript, PipelineError> {
        Err(PipelineError::transcription(self.0, "backend said no"))
    }
}

/// Transcription backend that never answers
pub struct HangingTranscriber;

#[async_trait]
impl TranscriptionProvider for HangingTranscriber {
    fn name(&self) -> &'static str {
        "hanging"
    }

    async fn transcribe(&self, _audio: &AudioAsset) -> Result<Transcript, PipelineError> {
        std::future::pending().await
    }
}

/// Analysis backend that always fails with `kind`
pub struct FailingEngine(pub FailureKind);

#[async_trait]
impl AnalysisEngine for FailingEngine {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn analyze(
        &self,
        _transcript: &Transcript,
        _audio: &AudioAsset,
    ) -> Result<AnalysisResult, PipelineError> {
        Err(PipelineError::analysis(self.0, "backend said no"))
    }
}

/// Analysis backend that never answers
pub struct HangingEngine;

#[async_trait]
impl AnalysisEngine for HangingEngine {
    fn name(&self) -> &'static str {
        "hanging"
    }

    async fn analyze(
        &self,
        _transcript: &Transcript,
        _audio: &AudioAsset,
    ) -> Result<AnalysisResult, PipelineError> {
        std::future::pending().await
    }
}
