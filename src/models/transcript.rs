use serde::{Deserialize, Serialize};

/// A time-aligned piece of the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn duration_secs(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Speech-to-text output
///
/// `text` is always present, possibly empty. Segments are optional detail;
/// analysis falls back to text-only mode when there are none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Transcript with text only
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
            segments: Vec::new(),
        }
    }

    pub fn has_segments(&self) -> bool {
        !self.segments.is_empty()
    }

    /// Total covered time from first segment start to last segment end
    pub fn duration_secs(&self) -> f64 {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => (last.end - first.start).max(0.0),
            _ => 0.0,
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Coarse audio-level cues derived from segment timing
///
/// Only segment timestamps are used; no signal processing happens here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioCues {
    /// Seconds between first segment start and last segment end
    pub duration_secs: f64,
    /// Gaps between consecutive segments longer than the pause threshold
    pub pause_count: usize,
    /// Longest gap between consecutive segments, in seconds
    pub longest_pause_secs: f64,
    /// Speaking rate over the covered duration
    pub words_per_minute: Option<f64>,
}

impl AudioCues {
    /// Gap between segments that counts as a pause
    pub const PAUSE_THRESHOLD_SECS: f64 = 1.0;

    /// Derive cues from a transcript, or `None` when it has no segments
    pub fn from_transcript(transcript: &Transcript) -> Option<Self> {
        if !transcript.has_segments() {
            return None;
        }

        let mut pause_count = 0;
        let mut longest_pause_secs: f64 = 0.0;
        for pair in transcript.segments.windows(2) {
            let gap = (pair[1].start - pair[0].end).max(0.0);
            if gap >= Self::PAUSE_THRESHOLD_SECS {
                pause_count += 1;
            }
            longest_pause_secs = longest_pause_secs.max(gap);
        }

        let duration_secs = transcript.duration_secs();
        let words_per_minute = if duration_secs > 0.0 {
            Some(transcript.word_count() as f64 / duration_secs * 60.0)
        } else {
            None
        };

        Some(Self {
            duration_secs,
            pause_count,
            longest_pause_secs,
            words_per_minute,
        })
    }
}
