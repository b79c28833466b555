//! FFmpeg CLI wrapper and clip downloader.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - FFprobe validation of clips
//! - Ordered concatenation of transition clips into one video
//! - Streaming HTTP download of generated clips

pub mod command;
pub mod concat;
pub mod download;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod progress;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{concat_list_entry, ConcatCompositor, ConcatEncoding};
pub use download::{HttpDownloader, HttpDownloaderConfig};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};
pub use progress::FfmpegProgress;
