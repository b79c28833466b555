//! Per-transition task: submit, poll, download.
//!
//! Each expected transition runs in its own task and reports what happened
//! to the [`ClipAssembler`](crate::assembler::ClipAssembler) over a channel.
//! Tasks never touch shared state beyond the phase semaphores.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore, SemaphorePermit};
use tracing::{debug, Instrument};

use reel_media::MediaError;
use reel_models::{DownloadedClip, JobState, SequenceIndex, TransitionJob, TransitionPhase};

use crate::collaborators::{ClipDownloader, GenerationService};
use crate::config::PollConfig;
use crate::logging::TransitionLogger;
use crate::metrics;
use crate::poller::poll_until_terminal;
use crate::retry::{retry_async, RetryConfig};

/// What a transition task reports to the assembler.
#[derive(Debug, Clone)]
pub enum TransitionEvent {
    /// The service accepted the request.
    Submitted {
        index: SequenceIndex,
        job: TransitionJob,
    },
    /// The clip is on local disk.
    Downloaded {
        job: TransitionJob,
        clip: DownloadedClip,
    },
    /// The transition will not produce a clip.
    Failed {
        index: SequenceIndex,
        job: Option<TransitionJob>,
        phase: TransitionPhase,
        reason: String,
    },
}

impl TransitionEvent {
    pub fn index(&self) -> SequenceIndex {
        match self {
            Self::Submitted { index, .. } | Self::Failed { index, .. } => *index,
            Self::Downloaded { clip, .. } => clip.sequence_index,
        }
    }
}

/// One semaphore per phase, each sized to the concurrency ceiling.
#[derive(Debug)]
pub struct PhaseLimits {
    submit: Semaphore,
    poll: Semaphore,
    download: Semaphore,
}

impl PhaseLimits {
    pub fn new(max_concurrency: usize) -> Self {
        let permits = max_concurrency.max(1);
        Self {
            submit: Semaphore::new(permits),
            poll: Semaphore::new(permits),
            download: Semaphore::new(permits),
        }
    }

    fn for_phase(&self, phase: TransitionPhase) -> &Semaphore {
        match phase {
            TransitionPhase::Submission | TransitionPhase::Upload => &self.submit,
            TransitionPhase::Polling => &self.poll,
            TransitionPhase::Download => &self.download,
        }
    }

    async fn acquire(&self, phase: TransitionPhase) -> Result<SemaphorePermit<'_>, String> {
        self.for_phase(phase)
            .acquire()
            .await
            .map_err(|_| format!("{} permit pool closed", phase))
    }
}

/// Everything the transition tasks of one run share.
pub struct WorkerContext {
    pub generator: Arc<dyn GenerationService>,
    pub downloader: Arc<dyn ClipDownloader>,
    pub prompt: String,
    pub clips_dir: PathBuf,
    pub poll: PollConfig,
    pub download_retry: RetryConfig,
    pub limits: PhaseLimits,
}

/// A transition whose two frames are both uploaded.
#[derive(Debug, Clone)]
pub struct TransitionTask {
    pub index: SequenceIndex,
    pub source_url: String,
    pub target_url: String,
    pub logger: TransitionLogger,
}

/// Run one transition to completion and report the outcome on `events`.
pub async fn run_transition(
    ctx: Arc<WorkerContext>,
    task: TransitionTask,
    events: mpsc::Sender<TransitionEvent>,
) {
    let span = task.logger.create_span();
    let index = task.index;
    let event = execute(&ctx, task, &events).instrument(span).await;

    metrics::record_transition(outcome_label(&event));
    send(&events, event).await;
    debug!(index = %index, "Transition task finished");
}

async fn execute(
    ctx: &WorkerContext,
    task: TransitionTask,
    events: &mpsc::Sender<TransitionEvent>,
) -> TransitionEvent {
    let TransitionTask {
        index,
        source_url,
        target_url,
        logger,
    } = task;

    let failed = |job: Option<TransitionJob>, phase, reason: String| TransitionEvent::Failed {
        index,
        job,
        phase,
        reason,
    };

    // Submit
    let submitted = {
        let _permit = match ctx.limits.acquire(TransitionPhase::Submission).await {
            Ok(p) => p,
            Err(reason) => return failed(None, TransitionPhase::Submission, reason),
        };
        logger.log_start("submitting generation");
        ctx.generator
            .submit(&ctx.prompt, &source_url, &target_url)
            .await
    };

    let job_id = match submitted {
        Ok(id) => id,
        Err(e) => {
            logger.log_error(&format!("submission failed: {}", e));
            return failed(None, TransitionPhase::Submission, e.to_string());
        }
    };

    let logger = logger.with_job_id(&job_id);
    let mut job = TransitionJob::submitted(job_id, index, source_url, target_url);
    logger.log_progress("submitted, polling");
    send(
        events,
        TransitionEvent::Submitted {
            index,
            job: job.clone(),
        },
    )
    .await;

    // Poll
    {
        let _permit = match ctx.limits.acquire(TransitionPhase::Polling).await {
            Ok(p) => p,
            Err(reason) => return failed(Some(job), TransitionPhase::Polling, reason),
        };
        poll_until_terminal(ctx.generator.as_ref(), &mut job, &ctx.poll, &logger).await;
    }

    let result_url = match &job.state {
        JobState::Completed { result_url } => result_url.clone(),
        JobState::Failed { reason } => {
            let reason = reason.clone();
            return failed(Some(job), TransitionPhase::Polling, reason);
        }
        JobState::TimedOut { waited_secs } => {
            let reason = format!("no result after {}s of polling", waited_secs);
            return failed(Some(job), TransitionPhase::Polling, reason);
        }
        other => {
            let reason = format!("polling stopped in non-terminal state {}", other);
            return failed(Some(job), TransitionPhase::Polling, reason);
        }
    };

    // Download
    let downloaded = {
        let _permit = match ctx.limits.acquire(TransitionPhase::Download).await {
            Ok(p) => p,
            Err(reason) => return failed(Some(job), TransitionPhase::Download, reason),
        };
        retry_async(&ctx.download_retry, MediaError::is_retryable, || {
            ctx.downloader
                .download(&result_url, &ctx.clips_dir, &job.job_id)
        })
        .await
    };

    match downloaded {
        Ok(path) => {
            logger.log_completion(&format!("clip saved to {}", path.display()));
            let clip = DownloadedClip::new(job.job_id.clone(), index, path);
            TransitionEvent::Downloaded { job, clip }
        }
        Err((e, attempts)) => {
            logger.log_error(&format!("download failed after {} attempts: {}", attempts, e));
            failed(Some(job), TransitionPhase::Download, e.to_string())
        }
    }
}

async fn send(events: &mpsc::Sender<TransitionEvent>, event: TransitionEvent) {
    let index = event.index();
    if events.send(event).await.is_err() {
        debug!(index = %index, "Assembler gone, dropping transition event");
    }
}

fn outcome_label(event: &TransitionEvent) -> &'static str {
    match event {
        TransitionEvent::Downloaded { .. } => "completed",
        TransitionEvent::Submitted { .. } => "submitted",
        TransitionEvent::Failed { phase, job, .. } => match (phase, job.as_ref().map(|j| &j.state)) {
            (TransitionPhase::Polling, Some(JobState::TimedOut { .. })) => "timed_out",
            (phase, _) => phase.as_str(),
        },
    }
}
