//! Video URL parsing.

use std::sync::OnceLock;

use regex::Regex;

fn id_patterns() -> &'static [Regex; 3] {
    static RES: OnceLock<[Regex; 3]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("static regex"),
            Regex::new(r"youtu\.be/([0-9A-Za-z_-]{11})").expect("static regex"),
            Regex::new(r"embed/([0-9A-Za-z_-]{11})").expect("static regex"),
        ]
    })
}

/// Pull the 11-character video id out of a watch, short, or embed URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    id_patterns()
        .iter()
        .find_map(|re| re.captures(url))
        .map(|caps| caps[1].to_string())
}
