pub mod config;
pub mod error;
pub mod heuristics;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod stages;

pub use config::{AnalysisBackend, AnalyzerConfig, TranscriptionBackend};
pub use error::{BackendError, FailureKind, PipelineError, Stage};
pub use heuristics::{apply_heuristics, HeuristicsConfig};
pub use io::{write_result_json, HumanReport, RequestWorkspace};
pub use llm::{AnthropicClient, AnthropicConfig};
pub use models::{
    AgentScore, AnalysisResult, AudioAsset, AudioCues, AudioEncoding, Intent, Segment, Sentiment,
    Tone, Transcript, Urgency,
};
pub use pipeline::{Pipeline, PipelineConfig, PipelineState, StageTimeouts};
pub use server::{create_router, AppState};
pub use stages::{
    AnalysisEngine, AudioNormalizer, HeuristicEngine, MockProvider, NormalizerConfig,
    RemoteEngine, RemoteProvider, TranscriptionProvider, WhisperConfig,
};
