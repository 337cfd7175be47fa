use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use secrecy::SecretString;

use redub_engine::{DubEngine, EngineConfig, SynthesisDriver};
use redub_media::{FfmpegEngine, TokioCommandRunner, YtDlpDownloader};
use redub_providers::{
    AudioStore, CaptionTrackSource, CascadingTranscriptSource, HttpAudioStore, HttpSynthesizer,
    HttpTranslator, LocalAudioStore, TimedTextSource,
};
use redub_server::ServerConfig;

#[derive(Parser)]
#[command(name = "redub", about = "Video dubbing pipeline server")]
struct Args {
    #[arg(long, env = "REDUB_PORT", default_value_t = 5000)]
    port: u16,

    /// Directory served at /audio; published outputs land here.
    #[arg(long, env = "REDUB_AUDIO_DIR", default_value = "audio_files")]
    audio_dir: PathBuf,

    /// Base URL callers use to reach this server (for locally served audio).
    #[arg(long, env = "REDUB_PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    #[arg(long, env = "REDUB_TIMEDTEXT_URL", default_value = "https://www.youtube.com")]
    timedtext_url: String,

    #[arg(long, env = "REDUB_CAPTIONS_URL", default_value = "https://www.youtube.com")]
    captions_url: String,

    #[arg(long, env = "REDUB_TRANSLATE_URL", default_value = "https://libretranslate.com")]
    translate_url: String,

    #[arg(long, env = "REDUB_SPEECH_URL", default_value = "https://api.murf.ai")]
    speech_url: String,

    #[arg(long, env = "REDUB_SPEECH_API_KEY", hide_env_values = true)]
    speech_api_key: String,

    /// Cloud audio storage endpoint; audio is served locally when unset.
    #[arg(long, env = "REDUB_STORAGE_URL")]
    storage_url: Option<String>,

    /// Language the source captions are fetched in.
    #[arg(long, env = "REDUB_SOURCE_LANGUAGE", default_value = "en")]
    source_language: String,

    /// How many segment groups are translated and synthesized at once.
    #[arg(long, env = "REDUB_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Skip the video download and mux; publish dubbed audio only.
    #[arg(long, env = "REDUB_DISABLE_MUX")]
    disable_mux: bool,

    #[arg(long, env = "REDUB_SWEEP_INTERVAL_SECS", default_value_t = 3600)]
    sweep_interval_secs: u64,

    #[arg(long, env = "REDUB_MAX_FILE_AGE_SECS", default_value_t = 3600)]
    max_file_age_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let public_base_url = args
        .public_base_url
        .clone()
        .unwrap_or_else(|| format!("http://localhost:{}", args.port));

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .build()?;

    let transcripts = CascadingTranscriptSource::new(
        TimedTextSource::new(client.clone(), args.timedtext_url.clone())
            .with_languages(vec![args.source_language.clone()]),
        CaptionTrackSource::new(client.clone(), args.captions_url.clone()),
    );
    let driver = SynthesisDriver::new(
        Arc::new(HttpTranslator::new(client.clone(), args.translate_url.clone())),
        Arc::new(HttpSynthesizer::new(
            client.clone(),
            args.speech_url.clone(),
            SecretString::from(args.speech_api_key.clone()),
        )),
    )
    .with_concurrency(args.concurrency);

    let runner = Arc::new(TokioCommandRunner::new());
    let media = Arc::new(FfmpegEngine::new(runner.clone()));
    let downloader = Arc::new(YtDlpDownloader::new(runner));

    let local_store: Arc<dyn AudioStore> =
        Arc::new(LocalAudioStore::new(&args.audio_dir, &public_base_url));
    let primary_store: Arc<dyn AudioStore> = match &args.storage_url {
        Some(url) => Arc::new(HttpAudioStore::new(client.clone(), url.clone())),
        None => Arc::clone(&local_store),
    };

    let engine = Arc::new(DubEngine::new(
        Arc::new(transcripts),
        driver,
        media,
        downloader,
        primary_store,
        local_store,
        EngineConfig {
            public_dir: args.audio_dir.clone(),
            source_language: args.source_language.clone(),
            mux_enabled: !args.disable_mux,
            ..Default::default()
        },
    ));

    let config = ServerConfig {
        port: args.port,
        audio_dir: args.audio_dir.clone(),
        sweep_interval_secs: args.sweep_interval_secs,
        max_file_age_secs: args.max_file_age_secs,
    };
    let handle = redub_server::start(config, engine).await?;
    tracing::info!(port = handle.port, "redub ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}
