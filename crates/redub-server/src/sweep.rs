//! Stale-file sweeping for the public audio directory.
//!
//! Published files are only useful for as long as a caller might still
//! fetch them; everything older than the age threshold is deleted unless
//! an in-flight job owns it. Best-effort: errors are logged and the next
//! tick tries again.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::server::DubService;

pub fn spawn(
    audio_dir: PathBuf,
    interval: Duration,
    max_age: Duration,
    service: Arc<dyn DubService>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so a fresh start does
        // not race jobs still publishing.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let keep = service.in_flight_outputs();
            let removed = sweep_once(&audio_dir, max_age, &keep).await;
            if removed > 0 {
                debug!(removed, "swept stale audio files");
            }
        }
    })
}

/// Delete files in `dir` older than `max_age`, sparing names in `keep`.
/// Returns how many files were removed.
pub async fn sweep_once(dir: &Path, max_age: Duration, keep: &HashSet<String>) -> usize {
    let mut removed = 0;
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "sweep could not read directory");
            return 0;
        }
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if keep.contains(&name) {
            continue;
        }
        let age = entry
            .metadata()
            .await
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.elapsed().ok());
        let Some(age) = age else { continue };
        if age < max_age {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(err) => {
                warn!(file = %entry.path().display(), error = %err, "sweep failed to remove file")
            }
        }
    }
    removed
}
