//! Structured transition logging.
//!
//! Every per-transition message carries the sequence index and both photo
//! names; the job id is attached once the service has assigned one.

use tracing::{error, info, warn, Span};

use reel_models::{photo_name, JobId, PhotoPair, SequenceIndex};

/// Logger for one transition's lifecycle.
#[derive(Debug, Clone)]
pub struct TransitionLogger {
    index: SequenceIndex,
    source: String,
    target: String,
    job_id: Option<String>,
}

impl TransitionLogger {
    pub fn new(pair: &PhotoPair<'_>) -> Self {
        Self {
            index: pair.index,
            source: photo_name(pair.source),
            target: photo_name(pair.target),
            job_id: None,
        }
    }

    /// Attach the job id assigned at submission.
    pub fn with_job_id(mut self, job_id: &JobId) -> Self {
        self.job_id = Some(job_id.to_string());
        self
    }

    fn job(&self) -> &str {
        self.job_id.as_deref().unwrap_or("-")
    }

    pub fn log_start(&self, message: &str) {
        info!(
            index = %self.index,
            job_id = %self.job(),
            source = %self.source,
            target = %self.target,
            "Transition started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            index = %self.index,
            job_id = %self.job(),
            source = %self.source,
            target = %self.target,
            "Transition progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            index = %self.index,
            job_id = %self.job(),
            source = %self.source,
            target = %self.target,
            "Transition warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            index = %self.index,
            job_id = %self.job(),
            source = %self.source,
            target = %self.target,
            "Transition error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            index = %self.index,
            job_id = %self.job(),
            source = %self.source,
            target = %self.target,
            "Transition completed: {}", message
        );
    }

    pub fn index(&self) -> SequenceIndex {
        self.index
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    /// Span covering the whole submit/poll/download task.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "transition",
            index = %self.index,
            source = %self.source,
            target = %self.target
        )
    }
}
