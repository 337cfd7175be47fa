//! External-service clients for the dubbing pipeline.
//!
//! Each collaborator is an `async_trait` seam with one production HTTP
//! implementation. Every network call runs through [`retry::with_retry`],
//! which retries transient failures with jittered exponential backoff and
//! honors server-provided `Retry-After` hints.

pub mod http;
pub mod retry;
pub mod speech;
pub mod storage;
pub mod transcript;
pub mod translate;
pub mod vtt;

pub use speech::{HttpSynthesizer, SpeechSynthesizer, SYNTH_MAX_CHARS};
pub use storage::{AudioStore, HttpAudioStore, LocalAudioStore};
pub use transcript::{CaptionTrackSource, CascadingTranscriptSource, TimedTextSource, TranscriptSource};
pub use translate::{HttpTranslator, Translator, TRANSLATE_MAX_CHARS};
