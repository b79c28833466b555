//! Transition job definitions.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifier assigned to a generation job by the remote service.
///
/// Opaque: never parsed, compared for ordering or assumed sequential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Position of a transition among all requested transitions.
///
/// Transition `i` bridges photo `i` and photo `i + 1`. This is the only key
/// used to order clips before composition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct SequenceIndex(pub usize);

impl SequenceIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for SequenceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status reported by the generation service for one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Still queued or generating.
    Pending,
    /// Finished; the clip can be fetched from `video_url`.
    Completed { video_url: String },
    /// The service gave up on this generation.
    Failed { reason: String },
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GenerationStatus::Pending)
    }
}

/// Lifecycle state of a transition job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    /// Accepted by the service, not polled yet
    #[default]
    Submitted,
    /// Polled at least once, still running
    Polling,
    /// Generation finished with a result URL
    Completed { result_url: String },
    /// Generation failed (service-side failure or too many poll errors)
    Failed { reason: String },
    /// Polling exceeded the configured maximum duration
    TimedOut { waited_secs: u64 },
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Submitted => "submitted",
            JobState::Polling => "polling",
            JobState::Completed { .. } => "completed",
            JobState::Failed { .. } => "failed",
            JobState::TimedOut { .. } => "timed_out",
        }
    }

    /// Check if this is a terminal state (no more transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed { .. } | JobState::Failed { .. } | JobState::TimedOut { .. }
        )
    }

    pub fn result_url(&self) -> Option<&str> {
        match self {
            JobState::Completed { result_url } => Some(result_url),
            _ => None,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One requested transition between two uploaded frames.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TransitionJob {
    pub job_id: JobId,
    pub sequence_index: SequenceIndex,
    pub source_url: String,
    pub target_url: String,
    pub state: JobState,
    pub poll_attempts: u32,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TransitionJob {
    /// Record a freshly submitted job.
    pub fn submitted(
        job_id: JobId,
        sequence_index: SequenceIndex,
        source_url: impl Into<String>,
        target_url: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            sequence_index,
            source_url: source_url.into(),
            target_url: target_url.into(),
            state: JobState::Submitted,
            poll_attempts: 0,
            submitted_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Apply the status returned by one poll.
    ///
    /// Returns `false` and leaves the job untouched if it is already terminal.
    pub fn record_poll(&mut self, status: &GenerationStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.poll_attempts += 1;
        let next = match status {
            GenerationStatus::Pending => JobState::Polling,
            GenerationStatus::Completed { video_url } => JobState::Completed {
                result_url: video_url.clone(),
            },
            GenerationStatus::Failed { reason } => JobState::Failed {
                reason: reason.clone(),
            },
        };
        self.transition_to(next);
        true
    }

    /// Mark the job failed without a service status (e.g. repeated poll errors).
    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.transition_to(JobState::Failed {
            reason: reason.into(),
        });
        true
    }

    /// Mark the job timed out after waiting `waited_secs`.
    pub fn time_out(&mut self, waited_secs: u64) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.transition_to(JobState::TimedOut { waited_secs });
        true
    }

    fn transition_to(&mut self, next: JobState) {
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        self.state = next;
    }
}
