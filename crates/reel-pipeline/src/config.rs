//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

/// Prompt used when neither the CLI nor the environment provides one.
pub const DEFAULT_PROMPT: &str = "Smoothly zoom in between two images seamlessly.";

/// Bounds for polling a single generation job.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Fixed delay between two polls of the same job
    pub interval: Duration,
    /// Give up after this long; `None` polls until a terminal status
    pub max_duration: Option<Duration>,
    /// Consecutive transport errors tolerated before the job is failed
    pub max_consecutive_errors: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_duration: Some(Duration::from_secs(1800)), // 30 minutes
            max_consecutive_errors: 5,
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory scanned for photos when none is given on the command line
    pub photo_directory: PathBuf,
    /// Where downloaded transition clips are written
    pub clips_directory: PathBuf,
    /// Final concatenated video
    pub final_video_path: PathBuf,
    /// Prompt sent with every transition
    pub prompt: String,
    /// Ceiling on in-flight operations per phase
    pub max_concurrency: usize,
    pub poll: PollConfig,
    /// Retries for a failed clip download (not counting the first attempt)
    pub download_retries: u32,
    /// Write `{output_stem}.report.json` next to the final video
    pub write_report: bool,
    /// Kill FFmpeg if the final concatenation runs longer than this
    pub compose_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            photo_directory: PathBuf::from("./photos"),
            clips_directory: PathBuf::from("./generated_videos"),
            final_video_path: PathBuf::from("final_output.mp4"),
            prompt: DEFAULT_PROMPT.to_string(),
            max_concurrency: 10,
            poll: PollConfig::default(),
            download_retries: 2,
            write_report: true,
            compose_timeout: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        let defaults = Self::default();

        let poll_timeout_secs: u64 = env_parse("PIPELINE_POLL_TIMEOUT_SECS")?.unwrap_or(1800);

        let config = Self {
            photo_directory: std::env::var("PHOTO_DIRECTORY")
                .map(PathBuf::from)
                .unwrap_or(defaults.photo_directory),
            clips_directory: std::env::var("GENERATED_VIDEOS_DIRECTORY")
                .map(PathBuf::from)
                .unwrap_or(defaults.clips_directory),
            final_video_path: std::env::var("FINAL_VIDEO_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.final_video_path),
            prompt: std::env::var("TRANSITION_PROMPT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.prompt),
            max_concurrency: env_parse("PIPELINE_MAX_CONCURRENCY")?.unwrap_or(10),
            poll: PollConfig {
                interval: Duration::from_secs(
                    env_parse("PIPELINE_POLL_INTERVAL_SECS")?.unwrap_or(5),
                ),
                max_duration: (poll_timeout_secs > 0)
                    .then(|| Duration::from_secs(poll_timeout_secs)),
                max_consecutive_errors: env_parse("PIPELINE_MAX_POLL_ERRORS")?.unwrap_or(5),
            },
            download_retries: env_parse("PIPELINE_DOWNLOAD_RETRIES")?.unwrap_or(2),
            write_report: env_parse("PIPELINE_WRITE_REPORT")?.unwrap_or(true),
            compose_timeout: env_parse::<u64>("PIPELINE_COMPOSE_TIMEOUT_SECS")?
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_concurrency == 0 {
            return Err(PipelineError::config_error(
                "PIPELINE_MAX_CONCURRENCY must be at least 1",
            ));
        }
        if self.poll.max_consecutive_errors == 0 {
            return Err(PipelineError::config_error(
                "PIPELINE_MAX_POLL_ERRORS must be at least 1",
            ));
        }
        if self.final_video_path.file_name().is_none() {
            return Err(PipelineError::config_error(format!(
                "FINAL_VIDEO_PATH has no file name: {}",
                self.final_video_path.display()
            )));
        }
        Ok(())
    }

    /// Location of the run report for this configuration.
    pub fn report_path(&self) -> PathBuf {
        let stem = self
            .final_video_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "final_output".to_string());
        self.final_video_path
            .with_file_name(format!("{}.report.json", stem))
    }
}

/// Parse an optional environment variable, failing on malformed values.
fn env_parse<T: std::str::FromStr>(key: &str) -> PipelineResult<Option<T>> {
    match std::env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
            PipelineError::config_error(format!("{} has an invalid value: {:?}", key, raw))
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_concurrency, 10);
        assert_eq!(config.poll.interval, Duration::from_secs(5));
        assert_eq!(config.poll.max_duration, Some(Duration::from_secs(1800)));
        assert_eq!(config.poll.max_consecutive_errors, 5);
        assert_eq!(config.prompt, DEFAULT_PROMPT);
        assert!(config.compose_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_report_path_sits_next_to_output() {
        let config = PipelineConfig {
            final_video_path: PathBuf::from("/out/reel.mp4"),
            ..Default::default()
        };
        assert_eq!(config.report_path(), PathBuf::from("/out/reel.report.json"));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let config = PipelineConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }
}
