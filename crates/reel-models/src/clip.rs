//! Downloaded clip model.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::{JobId, SequenceIndex};

/// A transition clip fetched to local disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DownloadedClip {
    pub job_id: JobId,
    pub sequence_index: SequenceIndex,
    pub path: PathBuf,
}

impl DownloadedClip {
    pub fn new(job_id: JobId, sequence_index: SequenceIndex, path: impl Into<PathBuf>) -> Self {
        Self {
            job_id,
            sequence_index,
            path: path.into(),
        }
    }

    /// Local file name for the clip of a job.
    pub fn file_name_for(job_id: &JobId) -> String {
        format!("transition_{}.mp4", job_id)
    }
}
