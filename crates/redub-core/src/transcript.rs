//! Transcript data model.

use serde::{Deserialize, Serialize};

/// One timed caption unit from the source video.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    pub text: String,
    /// Offset from the start of the video, in seconds.
    pub start: f64,
    /// How long the caption stays on screen, in seconds.
    pub duration: f64,
}

impl TranscriptEntry {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Format a second offset as `MM:SS.mmm` for transcript artifacts.
/// Minutes are not wrapped at the hour (a 90-minute mark prints as `90:00.000`).
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let minutes = total_ms / 60_000;
    let secs = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{minutes:02}:{secs:02}.{millis:03}")
}
