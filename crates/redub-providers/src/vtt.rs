//! WebVTT cue parsing for the caption-file fallback route.
//!
//! Tolerant by design: header lines, NOTE blocks, cue identifiers, and cue
//! settings are all skipped, and a cue line that fails to parse drops that
//! cue rather than the whole file. Timing comes straight from the cues, so
//! the fallback keeps real timestamps.

use redub_core::TranscriptEntry;

/// Parse WebVTT text into transcript entries. Multi-line cue payloads are
/// joined with a single space.
pub fn parse(input: &str) -> Vec<TranscriptEntry> {
    let mut entries = Vec::new();
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        let line = line.trim_start_matches('\u{feff}').trim();
        if line.starts_with("NOTE") {
            // NOTE blocks run to the next blank line.
            for skipped in lines.by_ref() {
                if skipped.trim().is_empty() {
                    break;
                }
            }
            continue;
        }
        if !line.contains("-->") {
            continue;
        }
        let Some((start, end)) = parse_cue_timing(line) else {
            continue;
        };
        let mut text = String::new();
        while let Some(payload) = lines.peek() {
            let payload = payload.trim();
            if payload.is_empty() {
                break;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(payload);
            lines.next();
        }
        if !text.is_empty() && end > start {
            entries.push(TranscriptEntry::new(text, start, end - start));
        }
    }
    entries
}

/// Parse `HH:MM:SS.mmm --> HH:MM:SS.mmm [settings]`; the hours field is
/// optional per the WebVTT grammar.
fn parse_cue_timing(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once("-->")?;
    let end = rest.trim().split_whitespace().next()?;
    Some((parse_timestamp(start.trim())?, parse_timestamp(end)?))
}

fn parse_timestamp(ts: &str) -> Option<f64> {
    let parts: Vec<&str> = ts.split(':').collect();
    let (h, m, s) = match parts.as_slice() {
        [m, s] => ("0", *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return None,
    };
    let hours: f64 = h.parse().ok()?;
    let minutes: f64 = m.parse().ok()?;
    let seconds: f64 = s.replace(',', ".").parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
