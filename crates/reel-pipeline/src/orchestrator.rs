//! Pipeline orchestrator.
//!
//! One run goes through:
//! 1. collect and sort photos
//! 2. upload every photo (order preserved, failures leave holes)
//! 3. one task per adjacent pair: submit, poll, download
//! 4. reorder clips by sequence index; any gap aborts the run
//! 5. concatenate the ordered clips

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use reel_gen_client::GenerationClient;
use reel_media::{ConcatCompositor, HttpDownloader, HttpDownloaderConfig};
use reel_models::{photo_name, PhotoSet, RunReport, TransitionPhase, UploadReport};
use reel_storage::EdgeStorageClient;

use crate::assembler::ClipAssembler;
use crate::collaborators::Collaborators;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::TransitionLogger;
use crate::metrics;
use crate::photos::collect_photos;
use crate::report::write_report;
use crate::retry::RetryConfig;
use crate::upload::upload_all;
use crate::worker::{run_transition, PhaseLimits, TransitionEvent, TransitionTask, WorkerContext};

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub output_path: PathBuf,
    pub report: RunReport,
}

/// Photo-to-video pipeline bound to one set of collaborators.
pub struct Pipeline {
    config: PipelineConfig,
    collaborators: Collaborators,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    /// Wire the production clients from environment variables.
    pub fn from_env(config: PipelineConfig) -> PipelineResult<Self> {
        let store = EdgeStorageClient::from_env()
            .map_err(|e| PipelineError::config_error(e.to_string()))?;
        let generator = GenerationClient::from_env()
            .map_err(|e| PipelineError::config_error(e.to_string()))?;
        let downloader = HttpDownloader::new(HttpDownloaderConfig::default())
            .map_err(|e| PipelineError::config_error(e.to_string()))?;
        let compositor = match config.compose_timeout {
            Some(limit) => ConcatCompositor::default().with_timeout(limit.as_secs()),
            None => ConcatCompositor::default(),
        };

        Ok(Self::new(
            config,
            Collaborators {
                store: Arc::new(store),
                generator: Arc::new(generator),
                downloader: Arc::new(downloader),
                compositor: Arc::new(compositor),
            },
        ))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Turn the photos in `photo_directory` into one video.
    ///
    /// Fails fast with `InsufficientInput` before any network call when fewer
    /// than two photos are found. Every transition is attempted before the
    /// run decides between `PartialFailure` and composition.
    pub async fn run(&self, photo_directory: &Path, prompt: &str) -> PipelineResult<RunOutcome> {
        let mut report = RunReport::new(prompt, photo_directory);
        info!(
            run_id = %report.run_id,
            directory = %photo_directory.display(),
            "Starting pipeline run"
        );

        let photos = collect_photos(photo_directory).await?;
        if photos.len() < 2 {
            warn!(found = photos.len(), "Not enough photos for a transition");
            return Err(PipelineError::InsufficientInput {
                found: photos.len(),
            });
        }

        let started = Instant::now();
        report.uploads = upload_all(
            Arc::clone(&self.collaborators.store),
            &photos,
            self.config.max_concurrency,
        )
        .await;
        metrics::record_phase_duration("upload", started.elapsed());
        info!(
            uploaded = report.uploaded_count(),
            total = photos.len(),
            "Upload phase finished"
        );

        let started = Instant::now();
        let assembler = self.run_transitions(&photos, &report.uploads, prompt).await;
        metrics::record_phase_duration("transitions", started.elapsed());
        report.transitions = assembler.transition_reports(&photos);

        let clips = match assembler.ordered_paths() {
            Ok(clips) => clips,
            Err(failure) => {
                for gap in &failure.gaps {
                    error!(
                        index = %gap.index,
                        job_id = ?gap.job_id.as_ref().map(|j| j.as_str()),
                        phase = %gap.phase,
                        "Missing transition: {}", gap.reason
                    );
                }
                self.persist_report(&mut report).await;
                return Err(PipelineError::PartialFailure(failure));
            }
        };

        let started = Instant::now();
        let output = self.config.final_video_path.clone();
        let composed = self
            .collaborators
            .compositor
            .concatenate(&clips, &output)
            .await;
        metrics::record_phase_duration("composition", started.elapsed());

        if let Err(e) = composed {
            error!(output = %output.display(), "Composition failed: {}", e);
            self.persist_report(&mut report).await;
            return Err(PipelineError::Composition(e));
        }

        report.output_path = Some(output.clone());
        self.persist_report(&mut report).await;
        info!(
            run_id = %report.run_id,
            clips = clips.len(),
            output = %output.display(),
            "Pipeline run complete"
        );

        Ok(RunOutcome {
            output_path: output,
            report,
        })
    }

    /// Submit, poll and download every transition; returns the filled assembler.
    async fn run_transitions(
        &self,
        photos: &PhotoSet,
        uploads: &[UploadReport],
        prompt: &str,
    ) -> ClipAssembler {
        let expected = photos.transition_count();
        let mut assembler = ClipAssembler::new(expected);
        let (tx, rx) = mpsc::channel(expected.max(1) * 2);

        let ctx = Arc::new(WorkerContext {
            generator: Arc::clone(&self.collaborators.generator),
            downloader: Arc::clone(&self.collaborators.downloader),
            prompt: prompt.to_string(),
            clips_dir: self.config.clips_directory.clone(),
            poll: self.config.poll.clone(),
            download_retry: RetryConfig::new("clip_download")
                .with_max_retries(self.config.download_retries),
            limits: PhaseLimits::new(self.config.max_concurrency),
        });

        let mut handles = Vec::with_capacity(expected);
        for pair in photos.pairs() {
            let i = pair.index.get();
            let source_url = uploads.get(i).and_then(|u| u.url.clone());
            let target_url = uploads.get(i + 1).and_then(|u| u.url.clone());

            match (source_url, target_url) {
                (Some(source_url), Some(target_url)) => {
                    let task = TransitionTask {
                        index: pair.index,
                        source_url,
                        target_url,
                        logger: TransitionLogger::new(&pair),
                    };
                    handles.push(tokio::spawn(run_transition(
                        Arc::clone(&ctx),
                        task,
                        tx.clone(),
                    )));
                }
                (source_url, target_url) => {
                    let missing: Vec<String> = [(source_url, pair.source), (target_url, pair.target)]
                        .into_iter()
                        .filter(|(url, _)| url.is_none())
                        .map(|(_, path)| photo_name(path))
                        .collect();
                    let reason = format!("not uploaded: {}", missing.join(", "));
                    TransitionLogger::new(&pair).log_error(&format!("skipping pair, {}", reason));
                    metrics::record_transition(TransitionPhase::Upload.as_str());
                    assembler.apply(TransitionEvent::Failed {
                        index: pair.index,
                        job: None,
                        phase: TransitionPhase::Upload,
                        reason,
                    });
                }
            }
        }

        // The channel closes once every task has dropped its sender
        drop(tx);
        assembler.collect(rx).await;

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Transition task panicked: {}", e);
            }
        }

        info!(
            expected,
            completed = assembler.completed_jobs(),
            "Transition phase finished"
        );
        assembler
    }

    async fn persist_report(&self, report: &mut RunReport) {
        report.finish();
        if !self.config.write_report {
            return;
        }
        let path = self.config.report_path();
        if let Err(e) = write_report(report, &path).await {
            warn!(path = %path.display(), "Failed to write run report: {}", e);
        }
    }
}
