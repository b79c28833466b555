//! Collects transition outcomes and restores sequence order.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use reel_models::{
    DownloadedClip, JobState, PhotoSet, SequenceIndex, TransitionJob, TransitionPhase,
    TransitionReport,
};

use crate::error::{PartialPipelineFailure, TransitionGap};
use crate::worker::TransitionEvent;

/// Latest known outcome of one transition.
#[derive(Debug, Clone, Default)]
struct Slot {
    job: Option<TransitionJob>,
    clip: Option<DownloadedClip>,
    failure: Option<(TransitionPhase, String)>,
}

/// Single owner of the sequence index -> outcome mapping for one run.
#[derive(Debug)]
pub struct ClipAssembler {
    expected: usize,
    slots: BTreeMap<SequenceIndex, Slot>,
}

impl ClipAssembler {
    /// Assembler for transitions `0..expected`.
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            slots: BTreeMap::new(),
        }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Apply one event. Events for indices outside the run are ignored.
    pub fn apply(&mut self, event: TransitionEvent) {
        let index = event.index();
        if index.get() >= self.expected {
            warn!(index = %index, expected = self.expected, "Ignoring event for unknown transition");
            return;
        }

        let slot = self.slots.entry(index).or_default();
        match event {
            TransitionEvent::Submitted { job, .. } => {
                // A late Submitted must not hide an outcome already recorded
                if slot.job.is_none() {
                    slot.job = Some(job);
                }
            }
            TransitionEvent::Downloaded { job, clip } => {
                slot.job = Some(job);
                slot.clip = Some(clip);
                slot.failure = None;
            }
            TransitionEvent::Failed {
                job, phase, reason, ..
            } => {
                if job.is_some() {
                    slot.job = job;
                }
                if slot.clip.is_none() {
                    slot.failure = Some((phase, reason));
                }
            }
        }
    }

    /// Drain `events` until every sender is dropped.
    pub async fn collect(&mut self, mut events: mpsc::Receiver<TransitionEvent>) {
        while let Some(event) = events.recv().await {
            debug!(index = %event.index(), "Received transition event");
            self.apply(event);
        }
    }

    /// Every expected index without a clip, in index order.
    pub fn gaps(&self) -> Vec<TransitionGap> {
        (0..self.expected)
            .map(SequenceIndex)
            .filter_map(|index| {
                let slot = self.slots.get(&index);
                if slot.and_then(|s| s.clip.as_ref()).is_some() {
                    return None;
                }

                let job_id = slot
                    .and_then(|s| s.job.as_ref())
                    .map(|j| j.job_id.clone());
                let (phase, reason) = match slot.and_then(|s| s.failure.clone()) {
                    Some(failure) => failure,
                    None if job_id.is_some() => (
                        TransitionPhase::Polling,
                        "task ended without reporting an outcome".to_string(),
                    ),
                    None => (
                        TransitionPhase::Submission,
                        "task ended without reporting an outcome".to_string(),
                    ),
                };

                Some(TransitionGap {
                    index,
                    job_id,
                    phase,
                    reason,
                })
            })
            .collect()
    }

    /// Clips ordered by sequence index, or every gap if any index is missing.
    pub fn ordered_clips(&self) -> Result<Vec<DownloadedClip>, PartialPipelineFailure> {
        let gaps = self.gaps();
        if !gaps.is_empty() {
            return Err(PartialPipelineFailure {
                expected: self.expected,
                gaps,
            });
        }

        // BTreeMap iterates in key order
        Ok(self
            .slots
            .values()
            .filter_map(|s| s.clip.clone())
            .collect())
    }

    /// Ordered clip paths ready for the compositor.
    pub fn ordered_paths(&self) -> Result<Vec<PathBuf>, PartialPipelineFailure> {
        Ok(self.ordered_clips()?.into_iter().map(|c| c.path).collect())
    }

    /// One report entry per expected transition.
    pub fn transition_reports(&self, photos: &PhotoSet) -> Vec<TransitionReport> {
        let gaps = self.gaps();

        photos
            .pairs()
            .take(self.expected)
            .map(|pair| {
                let slot = self.slots.get(&pair.index);
                let job = slot.and_then(|s| s.job.as_ref());
                let gap = gaps.iter().find(|g| g.index == pair.index);

                TransitionReport {
                    sequence_index: pair.index,
                    source_photo: pair.source.to_path_buf(),
                    target_photo: pair.target.to_path_buf(),
                    job_id: job.map(|j| j.job_id.clone()),
                    job_state: job.map(|j| j.state.clone()),
                    clip_path: slot.and_then(|s| s.clip.as_ref()).map(|c| c.path.clone()),
                    failed_phase: gap.map(|g| g.phase),
                    error: gap.map(|g| g.reason.clone()),
                }
            })
            .collect()
    }

    /// Number of transitions that reached `Completed` at the service.
    pub fn completed_jobs(&self) -> usize {
        self.slots
            .values()
            .filter(|s| matches!(s.job.as_ref().map(|j| &j.state), Some(JobState::Completed { .. })))
            .count()
    }
}
