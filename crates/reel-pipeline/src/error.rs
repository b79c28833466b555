//! Pipeline error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use reel_models::{JobId, SequenceIndex, TransitionPhase};

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("At least 2 photos are required, found {found}")]
    InsufficientInput { found: usize },

    #[error("{0}")]
    PartialFailure(PartialPipelineFailure),

    #[error("Composition failed: {0}")]
    Composition(#[source] reel_media::MediaError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Gaps carried by a partial failure, empty for every other variant.
    pub fn gaps(&self) -> &[TransitionGap] {
        match self {
            Self::PartialFailure(failure) => &failure.gaps,
            _ => &[],
        }
    }
}

/// An expected transition that produced no clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionGap {
    pub index: SequenceIndex,
    pub job_id: Option<JobId>,
    pub phase: TransitionPhase,
    pub reason: String,
}

impl fmt::Display for TransitionGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transition {} failed during {}", self.index, self.phase)?;
        if let Some(job_id) = &self.job_id {
            write!(f, " (job {})", job_id)?;
        }
        write!(f, ": {}", self.reason)
    }
}

/// Some transitions are missing, so no video can be composed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialPipelineFailure {
    pub expected: usize,
    /// Sorted by sequence index
    pub gaps: Vec<TransitionGap>,
}

impl PartialPipelineFailure {
    pub fn indices(&self) -> Vec<SequenceIndex> {
        self.gaps.iter().map(|g| g.index).collect()
    }
}

impl fmt::Display for PartialPipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} transitions missing",
            self.gaps.len(),
            self.expected
        )?;
        for gap in &self.gaps {
            write!(f, "; {}", gap)?;
        }
        Ok(())
    }
}
