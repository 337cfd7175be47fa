//! Subprocess-backed media processing: ffmpeg assembly, tempo correction,
//! muxing, and video download. All external tools run through the
//! [`command::CommandRunner`] seam so the pipelines are testable without
//! the binaries installed.

pub mod command;
pub mod download;
pub mod ffmpeg;
pub mod probe;

pub use command::{CommandOutput, CommandRunner, TokioCommandRunner};
pub use download::{VideoDownloader, YtDlpDownloader};
pub use ffmpeg::FfmpegEngine;
