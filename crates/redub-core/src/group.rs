//! Grouping of transcript entries into translation units.

use serde::{Deserialize, Serialize};

use crate::transcript::TranscriptEntry;

/// A run of consecutive transcript entries merged into one unit of text,
/// carrying the timeline interval it came from and the entries themselves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentGroup {
    pub segments: Vec<TranscriptEntry>,
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl SegmentGroup {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Merge consecutive entries into groups whose joined text stays within
/// `max_chars` characters. A group seals when appending the next entry's
/// text would overflow and the group already has text, so a single entry
/// longer than the budget still forms its own (oversized) group. Entries
/// with blank text contribute no text but are carried in the current
/// group's segments, so every entry lands in exactly one group. Each
/// group spans from the start of its first entry to the end of its last.
pub fn group_entries(entries: &[TranscriptEntry], max_chars: usize) -> Vec<SegmentGroup> {
    let mut groups = Vec::new();
    let mut segments: Vec<TranscriptEntry> = Vec::new();
    let mut text = String::new();
    let mut text_len = 0usize;
    let mut start = 0.0f64;
    let mut end = 0.0f64;

    for entry in entries {
        let piece = entry.text.trim();
        let piece_len = piece.chars().count();

        if !piece.is_empty() && !text.is_empty() && text_len + piece_len + 1 > max_chars {
            groups.push(SegmentGroup {
                segments: std::mem::take(&mut segments),
                text: std::mem::take(&mut text),
                start_time: start,
                end_time: end,
            });
            text_len = 0;
        }

        if segments.is_empty() {
            start = entry.start;
        }
        if !piece.is_empty() {
            if text.is_empty() {
                text.push_str(piece);
                text_len = piece_len;
            } else {
                text.push(' ');
                text.push_str(piece);
                text_len += 1 + piece_len;
            }
        }
        end = entry.end();
        segments.push(entry.clone());
    }

    if !segments.is_empty() {
        groups.push(SegmentGroup {
            segments,
            text,
            start_time: start,
            end_time: end,
        });
    }
    groups
}
