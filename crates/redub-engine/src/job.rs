//! End-to-end dubbing jobs.
//!
//! A job runs inside a `TempDir` working directory, so intermediate
//! clips, tracks, and downloads disappear on every exit path. Only the
//! published audio (and muxed video) land in the public directory.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

use redub_core::group::group_entries;
use redub_core::{language, video, DubError};
use redub_media::{FfmpegEngine, VideoDownloader};
use redub_providers::{AudioStore, TranscriptSource};

use crate::artifacts;
use crate::driver::SynthesisDriver;

/// Character budget when merging transcript entries into translation
/// units. Sized so the translated text usually fits one synthesis call.
pub const GROUP_MAX_CHARS: usize = 2500;

#[derive(Clone, Debug)]
pub struct DubRequest {
    pub video_url: String,
    pub voice_id: String,
    pub target_language: String,
}

#[derive(Clone, Debug)]
pub struct DubOutcome {
    /// URL where the dubbed audio can be fetched.
    pub audio_url: String,
    /// Filename of the muxed video in the public directory, when muxing
    /// is enabled.
    pub video_filename: Option<String>,
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Directory served at `/audio`; published outputs land here.
    pub public_dir: PathBuf,
    /// Language the source captions are in.
    pub source_language: String,
    pub group_max_chars: usize,
    /// When off, the job stops after publishing audio (no download, no mux).
    pub mux_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            public_dir: PathBuf::from("audio_files"),
            source_language: "en".to_string(),
            group_max_chars: GROUP_MAX_CHARS,
            mux_enabled: true,
        }
    }
}

/// In-flight job bookkeeping, shared with the server's health endpoint
/// and the file sweeper.
#[derive(Default)]
pub struct JobRegistry {
    jobs: DashMap<Uuid, Vec<String>>,
}

impl JobRegistry {
    pub fn active_count(&self) -> usize {
        self.jobs.len()
    }

    /// Output filenames the sweeper must not delete.
    pub fn in_flight_outputs(&self) -> HashSet<String> {
        self.jobs
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    fn register(self: &Arc<Self>, id: Uuid, outputs: Vec<String>) -> JobGuard {
        self.jobs.insert(id, outputs);
        JobGuard {
            registry: Arc::clone(self),
            id,
        }
    }
}

struct JobGuard {
    registry: Arc<JobRegistry>,
    id: Uuid,
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.registry.jobs.remove(&self.id);
    }
}

pub struct DubEngine {
    transcripts: Arc<dyn TranscriptSource>,
    driver: SynthesisDriver,
    media: Arc<FfmpegEngine>,
    downloader: Arc<dyn VideoDownloader>,
    store: Arc<dyn AudioStore>,
    fallback_store: Arc<dyn AudioStore>,
    registry: Arc<JobRegistry>,
    config: EngineConfig,
}

impl DubEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transcripts: Arc<dyn TranscriptSource>,
        driver: SynthesisDriver,
        media: Arc<FfmpegEngine>,
        downloader: Arc<dyn VideoDownloader>,
        store: Arc<dyn AudioStore>,
        fallback_store: Arc<dyn AudioStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            transcripts,
            driver,
            media,
            downloader,
            store,
            fallback_store,
            registry: Arc::new(JobRegistry::default()),
            config,
        }
    }

    pub fn registry(&self) -> Arc<JobRegistry> {
        Arc::clone(&self.registry)
    }

    pub async fn run(&self, request: DubRequest) -> Result<DubOutcome, DubError> {
        let video_id = video::extract_video_id(&request.video_url)
            .ok_or_else(|| DubError::InvalidInput("unrecognized video URL".to_string()))?;
        if request.voice_id.trim().is_empty() {
            return Err(DubError::InvalidInput("voiceId is required".to_string()));
        }
        let target_code = language::translation_code(&request.target_language)?;

        let job_id = Uuid::now_v7();
        let public_id = format!("dub_{job_id}");
        let audio_name = format!("{public_id}.wav");
        let video_name = format!("{public_id}.mp4");
        let _guard = self
            .registry
            .register(job_id, vec![audio_name.clone(), video_name.clone()]);

        info!(%job_id, video_id, target = target_code, "starting dub job");
        let workdir = tempfile::TempDir::new()?;

        // Download before the expensive synthesis work so an unfetchable
        // video fails the job early.
        let video_path = if self.config.mux_enabled {
            let dest = workdir.path().join("source.mp4");
            self.downloader.download(&request.video_url, &dest).await?;
            Some(dest)
        } else {
            None
        };

        let entries = self.transcripts.fetch(&video_id).await?;
        if entries.is_empty() {
            return Err(DubError::Unavailable(format!(
                "no transcript available for {video_id}"
            )));
        }
        let transcript_end = entries.last().map(|e| e.end()).unwrap_or(0.0);
        artifacts::write_original(workdir.path(), &entries).await;

        let groups = group_entries(&entries, self.config.group_max_chars);
        let output = self
            .driver
            .run(
                &groups,
                &self.config.source_language,
                target_code,
                &request.voice_id,
                workdir.path(),
            )
            .await?;
        artifacts::write_translated(workdir.path(), &groups, &output.translations).await;

        // The dubbed track targets the real video length when we have the
        // file; the transcript's end is the fallback timeline.
        let target_duration = match &video_path {
            Some(path) => self.media.probe_duration(path).await.unwrap_or(transcript_end),
            None => transcript_end,
        };

        let combined = workdir.path().join("combined.wav");
        self.media
            .assemble(&output.clips, target_duration, &combined)
            .await?;
        let synced = workdir.path().join("synced.wav");
        let final_audio = self
            .media
            .reconcile(&combined, target_duration, &synced)
            .await?;

        // Mux before publishing anything, so a failed job leaves no
        // output behind in the public directory.
        let video_filename = match video_path {
            Some(source) => {
                let out = self.config.public_dir.join(&video_name);
                tokio::fs::create_dir_all(&self.config.public_dir).await?;
                self.media.mux(&source, &final_audio, &out).await?;
                Some(video_name)
            }
            None => None,
        };

        let audio_url = match self.store.upload(&final_audio, &public_id).await {
            Ok(url) => url,
            Err(err) => {
                warn!(%job_id, error = %err, "cloud upload failed, serving locally");
                match self.fallback_store.upload(&final_audio, &public_id).await {
                    Ok(url) => url,
                    Err(fallback_err) => {
                        // The video is already published; take it back out
                        // rather than report a half-delivered job.
                        if let Some(name) = &video_filename {
                            let out = self.config.public_dir.join(name);
                            if let Err(remove_err) = tokio::fs::remove_file(&out).await {
                                warn!(%job_id, error = %remove_err, "failed to remove muxed video");
                            }
                        }
                        return Err(fallback_err);
                    }
                }
            }
        };

        info!(%job_id, audio_url, "dub job finished");
        Ok(DubOutcome {
            audio_url,
            video_filename,
        })
    }
}
