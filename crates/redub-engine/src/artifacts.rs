//! Transcript artifacts written alongside a job.
//!
//! Both files are debugging aids, so failures are logged and swallowed
//! rather than failing the job.

use std::fmt::Write as _;
use std::path::Path;

use tracing::warn;

use redub_core::transcript::format_timestamp;
use redub_core::{SegmentGroup, TranscriptEntry};

/// Timestamped original transcript, one entry per line.
pub async fn write_original(workdir: &Path, entries: &[TranscriptEntry]) {
    let mut body = String::new();
    for entry in entries {
        let _ = writeln!(body, "{}\t{}", format_timestamp(entry.start), entry.text);
    }
    write_file(workdir, "original_transcript.txt", &body).await;
}

/// Timestamped translations, one group per line.
pub async fn write_translated(workdir: &Path, groups: &[SegmentGroup], translations: &[String]) {
    let mut body = String::new();
    for (group, translation) in groups.iter().zip(translations) {
        let _ = writeln!(
            body,
            "{}\t{}",
            format_timestamp(group.start_time),
            translation
        );
    }
    write_file(workdir, "translated_transcript.txt", &body).await;
}

async fn write_file(workdir: &Path, name: &str, body: &str) {
    let path = workdir.join(name);
    if let Err(err) = tokio::fs::write(&path, body).await {
        warn!(path = %path.display(), error = %err, "failed to write transcript artifact");
    }
}
