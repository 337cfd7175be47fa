//! Media duration probing.
//!
//! ffmpeg prints `Duration: HH:MM:SS.cc` on stderr for any input it can
//! open; parsing that line is cheaper and more portable than depending on
//! ffprobe as a second binary.

use std::sync::OnceLock;

use regex::Regex;

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Duration: (\d+):(\d+):(\d+\.\d+)").expect("static regex"))
}

/// Pull the duration, in seconds, out of ffmpeg's stderr banner.
pub fn parse_duration(stderr: &str) -> Option<f64> {
    let caps = duration_regex().captures(stderr)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
