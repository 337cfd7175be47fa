//! Foundation types and pure algorithms for the redub dubbing pipeline.
//!
//! Everything in this crate is synchronous and I/O-free: transcript data
//! model, text chunking, segment grouping, tempo-cascade math, the language
//! table, retry math, and the shared error taxonomy. The async plumbing
//! (HTTP clients, ffmpeg, the server) lives in the sibling crates and
//! depends on this one.

pub mod chunk;
pub mod clip;
pub mod error;
pub mod group;
pub mod language;
pub mod retry;
pub mod tempo;
pub mod transcript;
pub mod video;

pub use clip::AudioClip;
pub use error::DubError;
pub use group::SegmentGroup;
pub use retry::RetryPolicy;
pub use transcript::TranscriptEntry;
