//! Synthesized audio clip handles.

use std::path::PathBuf;

/// One synthesized audio file anchored to an interval on the source
/// timeline. The anchor comes from the [`crate::SegmentGroup`] (or equal
/// sub-interval thereof) that produced the clip, never recomputed.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioClip {
    pub path: PathBuf,
    pub start_time: f64,
    pub end_time: f64,
}

impl AudioClip {
    pub fn new(path: impl Into<PathBuf>, start_time: f64, end_time: f64) -> Self {
        Self {
            path: path.into(),
            start_time,
            end_time,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Delay of this clip on the track's zero-based time axis, in whole
    /// milliseconds (the unit ffmpeg's `adelay` filter takes).
    pub fn delay_ms(&self) -> u64 {
        (self.start_time.max(0.0) * 1000.0).round() as u64
    }
}
