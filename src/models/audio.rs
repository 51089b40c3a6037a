use std::path::{Path, PathBuf};

use serde::Serialize;

/// Sample rate required by the transcription stage
pub const TARGET_SAMPLE_RATE: u32 = 16_000;
/// Channel count required by the transcription stage
pub const TARGET_CHANNELS: u16 = 1;

/// Encoding metadata for an audio file at rest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioEncoding {
    /// Container/codec label, e.g. "wav" or "mp3" (lower-case file extension for uploads)
    pub format: String,
    /// Sample rate in Hz, when known
    pub sample_rate: Option<u32>,
    /// Channel count, when known
    pub channels: Option<u16>,
}

impl AudioEncoding {
    /// Canonical encoding produced by the normalizer
    pub fn canonical() -> Self {
        Self {
            format: "wav".to_string(),
            sample_rate: Some(TARGET_SAMPLE_RATE),
            channels: Some(TARGET_CHANNELS),
        }
    }

    /// Encoding of an upload we have not probed, guessed from its extension
    pub fn unprobed(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            sample_rate: None,
            channels: None,
        }
    }

    pub fn is_canonical(&self) -> bool {
        self.format == "wav"
            && self.sample_rate == Some(TARGET_SAMPLE_RATE)
            && self.channels == Some(TARGET_CHANNELS)
    }
}

/// Handle to audio bytes on disk plus their encoding
///
/// The file itself is owned by the request workspace that created it; an
/// `AudioAsset` never outlives that workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioAsset {
    pub path: PathBuf,
    pub encoding: AudioEncoding,
}

impl AudioAsset {
    pub fn new(path: impl Into<PathBuf>, encoding: AudioEncoding) -> Self {
        Self {
            path: path.into(),
            encoding,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used when handing the audio to a remote backend
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("audio.{}", self.encoding.format))
    }
}
