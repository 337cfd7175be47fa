//! Per-group translation and synthesis.
//!
//! Groups are processed through an order-preserving bounded-concurrency
//! stream. The first failure cancels outstanding work and deletes every
//! clip file already written, so a job never leaves partial audio behind.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures::future::FutureExt;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use redub_core::chunk::split_text;
use redub_core::{AudioClip, DubError, SegmentGroup};
use redub_providers::{SpeechSynthesizer, Translator, SYNTH_MAX_CHARS};

/// Budget for re-chunking a translation that overflows the synthesis
/// limit. Deliberately below [`SYNTH_MAX_CHARS`] to leave headroom.
pub const RESYNTH_CHUNK_CHARS: usize = 2500;

const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug)]
pub struct DriverOutput {
    /// Clips in group order, anchored to the source timeline.
    pub clips: Vec<AudioClip>,
    /// One translation per group, in group order.
    pub translations: Vec<String>,
}

pub struct SynthesisDriver {
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    concurrency: usize,
}

impl SynthesisDriver {
    pub fn new(translator: Arc<dyn Translator>, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            translator,
            synthesizer,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Translate and synthesize every group, writing WAV clips into
    /// `workdir`. Clips keep group order and cover each group's interval;
    /// a translation too long for one synthesis call is re-chunked and its
    /// interval subdivided equally.
    pub async fn run(
        &self,
        groups: &[SegmentGroup],
        source_lang: &str,
        target_code: &str,
        voice_id: &str,
        workdir: &Path,
    ) -> Result<DriverOutput, DubError> {
        let written: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));

        // The futures are built up front (still lazy — nothing runs until
        // polled) rather than inside `StreamExt::map`, because a closure
        // borrowing the groups there trips rustc's higher-ranked lifetime
        // inference once this future sits behind a boxed dyn future
        // (rust-lang/rust#102211).
        let futures: Vec<_> = groups
            .iter()
            .enumerate()
            .map(|(index, group)| {
                let written = Arc::clone(&written);
                async move {
                    self.process_group(index, group, source_lang, target_code, voice_id, workdir, &written)
                        .await
                }
                .boxed()
            })
            .collect();

        let results: Result<Vec<(Vec<AudioClip>, String)>, DubError> = stream::iter(futures)
            .buffered(self.concurrency)
            .try_collect()
            .await;

        match results {
            Ok(per_group) => {
                let mut clips = Vec::new();
                let mut translations = Vec::new();
                for (group_clips, translation) in per_group {
                    clips.extend(group_clips);
                    translations.push(translation);
                }
                Ok(DriverOutput { clips, translations })
            }
            Err(err) => {
                let files = written.lock().map(|w| w.clone()).unwrap_or_default();
                for file in files {
                    if let Err(remove_err) = tokio::fs::remove_file(&file).await {
                        warn!(file = %file.display(), error = %remove_err, "failed to remove clip");
                    }
                }
                Err(err)
            }
        }
    }

    async fn process_group(
        &self,
        index: usize,
        group: &SegmentGroup,
        source_lang: &str,
        target_code: &str,
        voice_id: &str,
        workdir: &Path,
        written: &Mutex<Vec<PathBuf>>,
    ) -> Result<(Vec<AudioClip>, String), DubError> {
        let translated = self
            .translator
            .translate(&group.text, source_lang, target_code)
            .await?;

        let chunks = if translated.chars().count() <= SYNTH_MAX_CHARS {
            vec![translated.clone()]
        } else {
            debug!(index, chars = translated.chars().count(), "re-chunking long translation");
            split_text(&translated, RESYNTH_CHUNK_CHARS)
        };

        let k = chunks.len();
        let slice = group.duration() / k as f64;
        let mut clips = Vec::with_capacity(k);
        for (sub, chunk) in chunks.into_iter().enumerate() {
            let audio = self.synthesizer.synthesize(&chunk, voice_id).await?;
            let path = workdir.join(format!("clip_{index:04}_{sub:02}.wav"));
            tokio::fs::write(&path, &audio).await?;
            if let Ok(mut w) = written.lock() {
                w.push(path.clone());
            }
            let start = group.start_time + slice * sub as f64;
            let end = if sub + 1 == k {
                group.end_time
            } else {
                group.start_time + slice * (sub + 1) as f64
            };
            clips.push(AudioClip::new(path, start, end));
        }
        Ok((clips, translated))
    }
}
