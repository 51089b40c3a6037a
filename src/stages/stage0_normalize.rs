use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{FailureKind, PipelineError};
use crate::models::{AudioAsset, AudioEncoding, TARGET_CHANNELS, TARGET_SAMPLE_RATE};

/// Configuration for audio normalization
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Conversion tool, a bare program name resolved through PATH or a full path
    pub tool: PathBuf,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Output channel count
    pub channels: u16,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            tool: PathBuf::from("ffmpeg"),
            sample_rate: TARGET_SAMPLE_RATE,
            channels: TARGET_CHANNELS,
        }
    }
}

/// Converts arbitrary input audio to mono 16 kHz WAV with an external tool
#[derive(Debug, Clone)]
pub struct AudioNormalizer {
    config: NormalizerConfig,
}

impl AudioNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn tool(&self) -> &Path {
        &self.config.tool
    }

    /// Ask the tool for its version, to report availability at startup
    pub async fn probe(&self) -> Result<String, PipelineError> {
        let output = Command::new(&self.config.tool)
            .arg("-version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(PipelineError::normalization(
                FailureKind::ToolUnavailable,
                format!("tool unavailable: {:?} -version exited with {}", self.config.tool, output.status),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().to_string())
    }

    /// Convert `input` into a new file at `output`
    ///
    /// The input file is never modified. The child process is killed if the
    /// returned future is dropped, which is how stage timeouts and request
    /// cancellation stop a running conversion.
    pub async fn normalize(
        &self,
        input: &AudioAsset,
        output: &Path,
    ) -> Result<AudioAsset, PipelineError> {
        if input.path() == output {
            return Err(PipelineError::normalization(
                FailureKind::ConversionFailed,
                "conversion failed: output path must differ from input",
            ));
        }

        let args = self.conversion_args(input.path(), output);
        debug!(tool = ?self.config.tool, ?args, "Starting audio conversion");

        let child = Command::new(&self.config.tool)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let result = child.wait_with_output().await.map_err(|e| {
            PipelineError::normalization(
                FailureKind::ConversionFailed,
                format!("conversion failed: {}", e),
            )
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(PipelineError::normalization(
                FailureKind::ConversionFailed,
                format!("conversion failed: {}: {}", result.status, stderr_tail(&stderr)),
            ));
        }

        let produced = tokio::fs::metadata(output)
            .await
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(PipelineError::normalization(
                FailureKind::ConversionFailed,
                "conversion failed: tool produced no output",
            ));
        }

        info!(
            input_format = %input.encoding.format,
            sample_rate = self.config.sample_rate,
            channels = self.config.channels,
            "Audio normalized"
        );

        Ok(AudioAsset::new(
            output,
            AudioEncoding {
                format: "wav".to_string(),
                sample_rate: Some(self.config.sample_rate),
                channels: Some(self.config.channels),
            },
        ))
    }

    fn conversion_args(&self, input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-ac".to_string(),
            self.config.channels.to_string(),
            "-ar".to_string(),
            self.config.sample_rate.to_string(),
            "-f".to_string(),
            "wav".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }

    fn spawn_error(&self, err: std::io::Error) -> PipelineError {
        let (kind, prefix) = match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                (FailureKind::ToolUnavailable, "tool unavailable")
            }
            _ => (FailureKind::Io, "failed to start tool"),
        };
        PipelineError::normalization(
            kind,
            format!("{}: {:?}: {}", prefix, self.config.tool, err),
        )
    }
}

/// Last few lines of the tool's stderr, enough to explain a failure
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(3);
    let tail = lines[start..].join(" | ");
    if tail.is_empty() {
        "no diagnostic output".to_string()
    } else {
        tail
    }
}
