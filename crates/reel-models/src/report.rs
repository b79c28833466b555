//! Run report models.
//!
//! A run report is the user-facing record of one pipeline run: which photos
//! uploaded, what happened to every expected transition and where the final
//! video landed. It is written as JSON next to the output video.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::job::{JobId, JobState, SequenceIndex};

/// Unique identifier for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline phase in which a transition was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPhase {
    /// One of the two frames never uploaded
    Upload,
    Submission,
    Polling,
    Download,
}

impl TransitionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPhase::Upload => "upload",
            TransitionPhase::Submission => "submission",
            TransitionPhase::Polling => "polling",
            TransitionPhase::Download => "download",
        }
    }
}

impl fmt::Display for TransitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Upload result for one photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UploadReport {
    pub photo: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one expected transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TransitionReport {
    pub sequence_index: SequenceIndex,
    pub source_photo: PathBuf,
    pub target_photo: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_state: Option<JobState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_phase: Option<TransitionPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransitionReport {
    pub fn is_success(&self) -> bool {
        self.clip_path.is_some() && self.failed_phase.is_none()
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    pub run_id: RunId,
    pub prompt: String,
    pub photo_directory: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub uploads: Vec<UploadReport>,
    pub transitions: Vec<TransitionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl RunReport {
    pub fn new(prompt: impl Into<String>, photo_directory: impl Into<PathBuf>) -> Self {
        Self {
            run_id: RunId::new(),
            prompt: prompt.into(),
            photo_directory: photo_directory.into(),
            started_at: Utc::now(),
            finished_at: None,
            uploads: Vec::new(),
            transitions: Vec::new(),
            output_path: None,
        }
    }

    pub fn uploaded_count(&self) -> usize {
        self.uploads.iter().filter(|u| u.url.is_some()).count()
    }

    pub fn successful_transitions(&self) -> usize {
        self.transitions.iter().filter(|t| t.is_success()).count()
    }

    /// Transitions that did not produce a clip.
    pub fn gaps(&self) -> impl Iterator<Item = &TransitionReport> {
        self.transitions.iter().filter(|t| !t.is_success())
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
