use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::info;

use crate::llm::{AnthropicClient, AnthropicConfig};
use crate::pipeline::{Pipeline, PipelineConfig, StageTimeouts};
use crate::stages::{
    AnalysisEngine, AudioNormalizer, HeuristicEngine, MockProvider, NormalizerConfig,
    RemoteEngine, RemoteProvider, TranscriptionProvider, WhisperConfig,
};

/// Which transcription variant to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TranscriptionBackend {
    /// Canned transcript, no external calls
    Mock,
    /// OpenAI-compatible speech recognition API
    Remote,
}

/// Which analysis variant to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnalysisBackend {
    /// Keyword rules, no external calls
    Heuristic,
    /// Hosted language model
    Remote,
}

/// Everything needed to assemble a pipeline, resolved once at startup
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub transcription: TranscriptionBackend,
    pub analysis: AnalysisBackend,
    /// Conversion tool path or program name
    pub ffmpeg: PathBuf,
    /// Root for per-request scratch directories, system temp dir if unset
    pub scratch_dir: Option<PathBuf>,
    pub timeouts: StageTimeouts,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            transcription: TranscriptionBackend::Mock,
            analysis: AnalysisBackend::Heuristic,
            ffmpeg: PathBuf::from("ffmpeg"),
            scratch_dir: None,
            timeouts: StageTimeouts::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Assemble the pipeline, reading credentials only for remote variants
    pub fn build_pipeline(&self) -> Result<Pipeline> {
        let scratch_root = match &self.scratch_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create scratch directory: {:?}", dir))?;
                dir.clone()
            }
            None => std::env::temp_dir(),
        };

        let normalizer = AudioNormalizer::new(NormalizerConfig {
            tool: self.ffmpeg.clone(),
            ..Default::default()
        });
        let transcriber = build_transcription_provider(self.transcription, &self.timeouts)?;
        let engine = build_analysis_engine(self.analysis, &self.timeouts)?;

        info!(
            transcription = transcriber.name(),
            analysis = engine.name(),
            ffmpeg = ?self.ffmpeg,
            scratch_root = ?scratch_root,
            "Pipeline configured"
        );

        Ok(Pipeline::new(
            normalizer,
            transcriber,
            engine,
            PipelineConfig {
                scratch_root,
                timeouts: self.timeouts,
            },
        ))
    }
}

/// Instantiate the selected transcription variant
pub fn build_transcription_provider(
    backend: TranscriptionBackend,
    timeouts: &StageTimeouts,
) -> Result<Arc<dyn TranscriptionProvider>> {
    match backend {
        TranscriptionBackend::Mock => Ok(Arc::new(MockProvider::new())),
        TranscriptionBackend::Remote => {
            let mut config =
                WhisperConfig::from_env().context("Remote transcription is not configured")?;
            config.timeout = timeouts.transcribe;
            Ok(Arc::new(RemoteProvider::new(config)?))
        }
    }
}

/// Instantiate the selected analysis variant
pub fn build_analysis_engine(
    backend: AnalysisBackend,
    timeouts: &StageTimeouts,
) -> Result<Arc<dyn AnalysisEngine>> {
    match backend {
        AnalysisBackend::Heuristic => Ok(Arc::new(HeuristicEngine::default())),
        AnalysisBackend::Remote => {
            let mut config =
                AnthropicConfig::from_env().context("Remote analysis is not configured")?;
            config.timeout = timeouts.analyze;
            Ok(Arc::new(RemoteEngine::new(AnthropicClient::new(config)?)))
        }
    }
}
