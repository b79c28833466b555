//! Ordered concatenation of transition clips.
//!
//! Clips are joined with the FFmpeg concat demuxer and re-encoded to a single
//! H.264/AAC stream so clips with slightly different parameters still splice.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::ensure_dir;
use crate::probe::probe_video;

/// Encoding parameters for the final video.
#[derive(Debug, Clone)]
pub struct ConcatEncoding {
    pub video_codec: String,
    pub pixel_format: String,
    pub crf: u8,
    pub preset: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for ConcatEncoding {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
            crf: 20,
            preset: "medium".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
        }
    }
}

/// Joins clips, in the order given, into one output file.
#[derive(Debug, Clone, Default)]
pub struct ConcatCompositor {
    encoding: ConcatEncoding,
    timeout_secs: Option<u64>,
}

impl ConcatCompositor {
    pub fn new(encoding: ConcatEncoding) -> Self {
        Self {
            encoding,
            timeout_secs: None,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Concatenate `clips` into `output`.
    ///
    /// Every clip is probed first; an unreadable clip fails the whole call
    /// before FFmpeg is started.
    pub async fn concatenate(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()> {
        if clips.is_empty() {
            return Err(MediaError::NoClips);
        }

        let mut total_secs = 0.0;
        for clip in clips {
            let info = probe_video(clip).await?;
            debug!(
                clip = %clip.display(),
                duration = info.duration,
                width = info.width,
                height = info.height,
                "Validated clip"
            );
            total_secs += info.duration;
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent).await?;
        }

        let list_dir = tempfile::tempdir()?;
        let list_path = list_dir.path().join("concat.txt");
        let list: String = clips.iter().map(|c| concat_list_entry(c)).collect();
        tokio::fs::write(&list_path, list).await?;

        let enc = &self.encoding;
        let cmd = FfmpegCommand::new(&list_path, output)
            .concat_demuxer()
            .video_codec(enc.video_codec.as_str())
            .preset(enc.preset.as_str())
            .crf(enc.crf)
            .pixel_format(enc.pixel_format.as_str())
            .audio_codec(enc.audio_codec.as_str())
            .audio_bitrate(enc.audio_bitrate.as_str())
            .output_args(["-movflags", "+faststart"]);

        let mut runner = FfmpegRunner::new();
        if let Some(secs) = self.timeout_secs {
            runner = runner.with_timeout(secs);
        }

        info!(
            clips = clips.len(),
            duration_secs = total_secs,
            output = %output.display(),
            "Concatenating clips"
        );

        let total_ms = (total_secs * 1000.0) as i64;
        runner
            .run_with_progress(&cmd, move |p| {
                debug!("Concat progress: {:.1}%", p.percentage(total_ms));
            })
            .await?;

        info!(output = %output.display(), "Final video written");
        Ok(())
    }
}

/// One `file '...'` line for a concat demuxer list.
///
/// The demuxer resolves relative entries against the list file's directory,
/// so relative paths are made absolute against the working directory first.
/// Single quotes inside the path are closed, escaped, and reopened.
pub fn concat_list_entry(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let escaped = absolute.to_string_lossy().replace('\'', "'\\''");
    format!("file '{}'\n", escaped)
}
