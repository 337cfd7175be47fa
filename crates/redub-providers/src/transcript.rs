//! Transcript acquisition.
//!
//! The primary route reads the timedtext XML endpoint; the fallback
//! scrapes a caption track served as WebVTT. [`CascadingTranscriptSource`]
//! stitches them together, preferring the primary's error message when
//! both routes fail.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use redub_core::{DubError, RetryPolicy, TranscriptEntry};

use crate::http::{ensure_success, transport_error};
use crate::retry::with_retry;

/// Ordered captions for one video.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptEntry>, DubError>;
}

fn cue_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<text start="([0-9.]+)" dur="([0-9.]+)"[^>]*>(.*?)</text>"#)
            .expect("static regex")
    })
}

fn unescape(text: &str) -> String {
    text.replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Extract `<text start dur>` cues from a timedtext XML document.
fn parse_timed_text(body: &str) -> Vec<TranscriptEntry> {
    cue_regex()
        .captures_iter(body)
        .filter_map(|caps| {
            let start: f64 = caps[1].parse().ok()?;
            let dur: f64 = caps[2].parse().ok()?;
            let text = unescape(caps[3].trim());
            (!text.is_empty()).then(|| TranscriptEntry::new(text, start, dur))
        })
        .collect()
}

/// Primary source: the timedtext XML endpoint, tried per preferred
/// language in order.
pub struct TimedTextSource {
    client: reqwest::Client,
    base_url: String,
    languages: Vec<String>,
    policy: RetryPolicy,
}

impl TimedTextSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            languages: vec!["en".to_string()],
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        if !languages.is_empty() {
            self.languages = languages;
        }
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn fetch_language(
        &self,
        video_id: &str,
        lang: &str,
    ) -> Result<Vec<TranscriptEntry>, DubError> {
        let url = format!("{}/api/timedtext", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("v", video_id), ("lang", lang)])
            .send()
            .await
            .map_err(|e| transport_error("timedtext", e))?;
        let body = ensure_success("timedtext", response)
            .await?
            .text()
            .await
            .map_err(|e| transport_error("timedtext", e))?;
        Ok(parse_timed_text(&body))
    }
}

#[async_trait]
impl TranscriptSource for TimedTextSource {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptEntry>, DubError> {
        let mut last_err =
            DubError::Unavailable(format!("no transcript available for {video_id}"));
        for lang in &self.languages {
            let result = with_retry(&self.policy, "timedtext", || {
                self.fetch_language(video_id, lang)
            })
            .await;
            match result {
                Ok(entries) if !entries.is_empty() => {
                    debug!(video_id, lang, cues = entries.len(), "timedtext transcript fetched");
                    return Ok(entries);
                }
                Ok(_) => {
                    last_err = DubError::Unavailable(format!(
                        "timedtext returned no cues for {video_id} ({lang})"
                    ));
                }
                Err(err) => last_err = err,
            }
        }
        Err(last_err)
    }
}

/// Fallback source: a caption track served as WebVTT. Cue timestamps are
/// kept, so timing stays accurate on this route too.
pub struct CaptionTrackSource {
    client: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
}

impl CaptionTrackSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn fetch_track(&self, video_id: &str) -> Result<Vec<TranscriptEntry>, DubError> {
        let url = format!("{}/captions/{video_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error("captions", e))?;
        let body = ensure_success("captions", response)
            .await?
            .text()
            .await
            .map_err(|e| transport_error("captions", e))?;
        Ok(crate::vtt::parse(&body))
    }
}

#[async_trait]
impl TranscriptSource for CaptionTrackSource {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptEntry>, DubError> {
        let entries =
            with_retry(&self.policy, "captions", || self.fetch_track(video_id)).await?;
        if entries.is_empty() {
            return Err(DubError::Unavailable(format!(
                "caption track for {video_id} is empty"
            )));
        }
        Ok(entries)
    }
}

/// Tries the primary source, then the fallback; surfaces the primary's
/// error when both fail (it names the authoritative route).
pub struct CascadingTranscriptSource<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> CascadingTranscriptSource<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl<P: TranscriptSource, F: TranscriptSource> TranscriptSource
    for CascadingTranscriptSource<P, F>
{
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptEntry>, DubError> {
        let primary_err = match self.primary.fetch(video_id).await {
            Ok(entries) => return Ok(entries),
            Err(err) => err,
        };
        warn!(video_id, error = %primary_err, "primary transcript source failed, trying fallback");
        match self.fallback.fetch(video_id).await {
            Ok(entries) => Ok(entries),
            Err(fallback_err) => {
                warn!(video_id, error = %fallback_err, "fallback transcript source failed");
                Err(primary_err)
            }
        }
    }
}
