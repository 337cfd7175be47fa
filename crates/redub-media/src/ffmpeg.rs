//! ffmpeg pipelines: clip assembly, tempo correction, duration
//! reconciliation, and muxing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use redub_core::tempo::{self, tempo_stages};
use redub_core::{AudioClip, DubError};

use crate::command::{CommandOutput, CommandRunner};
use crate::probe::parse_duration;

pub struct FfmpegEngine {
    runner: Arc<dyn CommandRunner>,
    ffmpeg_path: String,
}

/// Build the argument list that overlays `clips` onto a silent timeline:
/// one input per clip, each delayed to its start time, mixed down and cut
/// at `target_duration`. Callers handle the 0- and 1-clip cases.
fn assemble_args(clips: &[AudioClip], target_duration: f64, out: &Path) -> Vec<String> {
    let mut args = Vec::new();
    let mut filters = Vec::new();
    let mut mix_inputs = String::new();
    for (i, clip) in clips.iter().enumerate() {
        args.push("-i".to_string());
        args.push(clip.path.to_string_lossy().into_owned());
        let ms = clip.delay_ms();
        filters.push(format!("[{i}:a]adelay={ms}|{ms}[d{i}]"));
        mix_inputs.push_str(&format!("[d{i}]"));
    }
    filters.push(format!(
        "{mix_inputs}amix=inputs={}:duration=longest[out]",
        clips.len()
    ));
    args.extend([
        "-filter_complex".to_string(),
        filters.join(";"),
        "-map".to_string(),
        "[out]".to_string(),
        "-t".to_string(),
        format!("{target_duration}"),
        "-y".to_string(),
        out.to_string_lossy().into_owned(),
    ]);
    args
}

fn mux_args(video: &Path, audio: &Path, out: &Path) -> Vec<String> {
    vec![
        "-i".to_string(),
        video.to_string_lossy().into_owned(),
        "-i".to_string(),
        audio.to_string_lossy().into_owned(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-shortest".to_string(),
        "-y".to_string(),
        out.to_string_lossy().into_owned(),
    ]
}

impl FfmpegEngine {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }

    pub fn with_ffmpeg_path(mut self, path: impl Into<String>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    async fn run(&self, what: &str, args: Vec<String>) -> Result<CommandOutput, DubError> {
        let output = self.runner.run(&self.ffmpeg_path, &args).await?;
        if !output.success() {
            let detail: String = output
                .stderr
                .chars()
                .rev()
                .take(500)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            return Err(DubError::Processing(format!(
                "ffmpeg {what} failed (exit {}): {}",
                output.exit_code,
                detail.trim()
            )));
        }
        Ok(output)
    }

    /// Duration of a media file in seconds. Any failure degrades to
    /// `None`; callers decide whether timing without it is acceptable.
    pub async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let args = vec![
            "-i".to_string(),
            path.to_string_lossy().into_owned(),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ];
        match self.runner.run(&self.ffmpeg_path, &args).await {
            Ok(output) => parse_duration(&output.stderr).or_else(|| parse_duration(&output.stdout)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "duration probe failed");
                None
            }
        }
    }

    /// Overlay clips onto a single track of `target_duration` seconds.
    pub async fn assemble(
        &self,
        clips: &[AudioClip],
        target_duration: f64,
        out: &Path,
    ) -> Result<(), DubError> {
        match clips {
            [] => Err(DubError::Processing(
                "no audio clips to assemble".to_string(),
            )),
            [only] => {
                tokio::fs::copy(&only.path, out).await?;
                Ok(())
            }
            _ => {
                info!(clips = clips.len(), target_duration, "assembling audio track");
                self.run("assemble", assemble_args(clips, target_duration, out))
                    .await?;
                Ok(())
            }
        }
    }

    /// Re-time `input` by `factor` (>1 speeds up). Near-unity factors skip
    /// the re-encode and copy the file through.
    pub async fn adjust_tempo(
        &self,
        input: &Path,
        factor: f64,
        out: &Path,
    ) -> Result<(), DubError> {
        if tempo::is_negligible(factor) {
            tokio::fs::copy(input, out).await?;
            return Ok(());
        }
        let stages = tempo_stages(factor)?;
        let filter = tempo::stages_filter(&stages);
        info!(factor, %filter, "adjusting audio tempo");
        let args = vec![
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-filter:a".to_string(),
            filter,
            "-y".to_string(),
            out.to_string_lossy().into_owned(),
        ];
        self.run("tempo", args).await?;
        Ok(())
    }

    /// Bring `track` to `target_duration` by probing its real length and
    /// applying the matching tempo factor. When the probe fails the track
    /// is returned uncorrected rather than failing the job.
    pub async fn reconcile(
        &self,
        track: &Path,
        target_duration: f64,
        out: &Path,
    ) -> Result<PathBuf, DubError> {
        if target_duration <= 0.0 {
            warn!(target_duration, "non-positive target duration, skipping tempo correction");
            return Ok(track.to_path_buf());
        }
        let Some(actual) = self.probe_duration(track).await else {
            warn!(track = %track.display(), "probe failed, keeping uncorrected track");
            return Ok(track.to_path_buf());
        };
        let factor = actual / target_duration;
        if tempo::is_negligible(factor) {
            return Ok(track.to_path_buf());
        }
        self.adjust_tempo(track, factor, out).await?;
        Ok(out.to_path_buf())
    }

    /// Remux the original video stream with the dubbed audio track. A
    /// failed mux removes any partial output before surfacing the error.
    pub async fn mux(&self, video: &Path, audio: &Path, out: &Path) -> Result<(), DubError> {
        let result = self.run("mux", mux_args(video, audio, out)).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(out).await;
        }
        result.map(|_| ())
    }
}
