//! Orchestrator tests against in-memory collaborators.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use mockall::mock;
use rand::Rng;
use tempfile::TempDir;

use reel_gen_client::{GenError, GenResult};
use reel_media::{MediaError, MediaResult};
use reel_models::{GenerationStatus, JobId, SequenceIndex, TransitionPhase};
use reel_pipeline::{
    AssetStore, ClipDownloader, Collaborators, Compositor, GenerationService, Pipeline,
    PipelineConfig, PipelineError, PollConfig,
};
use reel_storage::{StorageError, StorageResult};

// =============================================================================
// Fakes
// =============================================================================

fn name_of(url_or_path: &str) -> String {
    url_or_path
        .rsplit('/')
        .next()
        .unwrap_or(url_or_path)
        .to_string()
}

/// Tracks how many calls are in flight at once.
#[derive(Default)]
struct Gauge {
    now: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.now.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.now.fetch_sub(1, Ordering::SeqCst);
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct FakeStore {
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

#[async_trait]
impl AssetStore for FakeStore {
    async fn upload(&self, path: &Path) -> StorageResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = name_of(&path.to_string_lossy());
        let jitter = rand::rng().random_range(0..10);
        tokio::time::sleep(Duration::from_millis(jitter)).await;

        if self.failing.lock().unwrap().contains(&name) {
            return Err(StorageError::upload_failed(500, "zone unavailable"));
        }
        Ok(format!("https://cdn.test/{}", name))
    }
}

/// How a submitted job behaves when polled, keyed by source photo name.
#[derive(Clone, Debug)]
enum Behaviour {
    CompleteAfter(u32),
    FailWith(String),
    Never,
}

struct JobScript {
    source: String,
    behaviour: Behaviour,
}

#[derive(Default)]
struct FakeGenerator {
    /// Source photo names whose submission is rejected
    rejected: Mutex<HashSet<String>>,
    behaviours: Mutex<HashMap<String, Behaviour>>,
    submissions: Mutex<Vec<(String, String, String)>>,
    pairs: Mutex<HashMap<JobId, (String, String)>>,
    jobs: Mutex<HashMap<JobId, JobScript>>,
    polls: AtomicUsize,
    /// Source photo name and time of every poll
    poll_log: Mutex<Vec<(String, Instant)>>,
    submit_gauge: Gauge,
}

impl FakeGenerator {
    fn submit_calls(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationService for FakeGenerator {
    async fn submit(&self, prompt: &str, frame_a_url: &str, frame_b_url: &str) -> GenResult<JobId> {
        self.submit_gauge.enter();
        let jitter = rand::rng().random_range(0..8);
        tokio::time::sleep(Duration::from_millis(jitter)).await;
        self.submit_gauge.exit();

        self.submissions.lock().unwrap().push((
            prompt.to_string(),
            frame_a_url.to_string(),
            frame_b_url.to_string(),
        ));

        let source = name_of(frame_a_url);
        if self.rejected.lock().unwrap().contains(&source) {
            return Err(GenError::Submission("HTTP 400: keyframe rejected".into()));
        }

        // Opaque ids that do not sort in submission order
        let id = JobId::from(format!("gen-{:016x}", rand::rng().random::<u64>()));
        let behaviour = self
            .behaviours
            .lock()
            .unwrap()
            .get(&source)
            .cloned()
            .unwrap_or_else(|| Behaviour::CompleteAfter(rand::rng().random_range(0..4)));

        self.pairs.lock().unwrap().insert(
            id.clone(),
            (frame_a_url.to_string(), frame_b_url.to_string()),
        );
        self.jobs
            .lock()
            .unwrap()
            .insert(id.clone(), JobScript { source, behaviour });
        Ok(id)
    }

    async fn poll(&self, job_id: &JobId) -> GenResult<GenerationStatus> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let jitter = rand::rng().random_range(0..3);
        tokio::time::sleep(Duration::from_millis(jitter)).await;

        let mut jobs = self.jobs.lock().unwrap();
        let script = jobs
            .get_mut(job_id)
            .ok_or_else(|| GenError::Poll(format!("unknown job {}", job_id)))?;
        self.poll_log
            .lock()
            .unwrap()
            .push((script.source.clone(), Instant::now()));

        Ok(match &mut script.behaviour {
            Behaviour::CompleteAfter(n) if *n > 0 => {
                *n -= 1;
                GenerationStatus::Pending
            }
            Behaviour::CompleteAfter(_) => GenerationStatus::Completed {
                video_url: format!("https://videos.test/{}/{}.mp4", script.source, job_id),
            },
            Behaviour::FailWith(reason) => GenerationStatus::Failed {
                reason: reason.clone(),
            },
            Behaviour::Never => GenerationStatus::Pending,
        })
    }
}

#[derive(Default)]
struct FakeDownloader {
    /// Source photo name -> remaining 503 responses
    flaky: Mutex<HashMap<String, u32>>,
    /// Source photo names that always 404
    missing: Mutex<HashSet<String>>,
    attempts: AtomicUsize,
    /// Source photo name and start time of every attempt
    attempt_log: Mutex<Vec<(String, Instant)>>,
    gauge: Gauge,
}

#[async_trait]
impl ClipDownloader for FakeDownloader {
    async fn download(&self, url: &str, dest_dir: &Path, job_id: &JobId) -> MediaResult<PathBuf> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let source = url.split('/').rev().nth(1).unwrap_or_default().to_string();
        self.attempt_log
            .lock()
            .unwrap()
            .push((source.clone(), Instant::now()));

        self.gauge.enter();
        let jitter = rand::rng().random_range(0..15);
        tokio::time::sleep(Duration::from_millis(jitter)).await;
        self.gauge.exit();

        if self.missing.lock().unwrap().contains(&source) {
            return Err(MediaError::download_status(404, url));
        }
        if let Some(remaining) = self.flaky.lock().unwrap().get_mut(&source) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(MediaError::download_status(503, url));
            }
        }

        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(format!("transition_{}.mp4", job_id));
        tokio::fs::write(&path, url.as_bytes()).await?;
        Ok(path)
    }
}

mock! {
    pub Comp {}

    #[async_trait]
    impl Compositor for Comp {
        async fn concatenate(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()>;
    }
}

/// Compositor that records its input and writes a placeholder output.
fn recording_compositor() -> (MockComp, Arc<Mutex<Vec<Vec<PathBuf>>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&calls);

    let mut mock = MockComp::new();
    mock.expect_concatenate().returning(move |clips, output| {
        recorded.lock().unwrap().push(clips.to_vec());
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, b"final")?;
        Ok(())
    });
    (mock, calls)
}

fn unused_compositor() -> MockComp {
    let mut mock = MockComp::new();
    mock.expect_concatenate().never();
    mock
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    _tmp: TempDir,
    photos_dir: PathBuf,
    config: PipelineConfig,
    store: Arc<FakeStore>,
    generator: Arc<FakeGenerator>,
    downloader: Arc<FakeDownloader>,
}

impl Harness {
    fn new(photos: &[&str]) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let photos_dir = tmp.path().join("photos");
        std::fs::create_dir_all(&photos_dir).unwrap();
        for name in photos {
            std::fs::write(photos_dir.join(name), b"\x89PNG").unwrap();
        }

        let config = PipelineConfig {
            photo_directory: photos_dir.clone(),
            clips_directory: tmp.path().join("clips"),
            final_video_path: tmp.path().join("out").join("final.mp4"),
            prompt: "zoom".into(),
            max_concurrency: 10,
            poll: PollConfig {
                interval: Duration::from_millis(5),
                max_duration: Some(Duration::from_secs(5)),
                max_consecutive_errors: 3,
            },
            download_retries: 2,
            write_report: true,
            compose_timeout: None,
        };

        Self {
            _tmp: tmp,
            photos_dir,
            config,
            store: Arc::new(FakeStore::default()),
            generator: Arc::new(FakeGenerator::default()),
            downloader: Arc::new(FakeDownloader::default()),
        }
    }

    fn pipeline(&self, compositor: MockComp) -> Pipeline {
        Pipeline::new(
            self.config.clone(),
            Collaborators {
                store: self.store.clone(),
                generator: self.generator.clone(),
                downloader: self.downloader.clone(),
                compositor: Arc::new(compositor),
            },
        )
    }

    async fn run(&self, compositor: MockComp) -> Result<reel_pipeline::RunOutcome, PipelineError> {
        self.pipeline(compositor).run(&self.photos_dir, "zoom").await
    }

    /// Source and target URL each composed clip was generated from.
    fn pairs_for(&self, clips: &[PathBuf]) -> Vec<(String, String)> {
        let pairs = self.generator.pairs.lock().unwrap();
        clips
            .iter()
            .map(|clip| {
                let file = clip.file_name().unwrap().to_string_lossy().into_owned();
                let id = file
                    .strip_prefix("transition_")
                    .and_then(|s| s.strip_suffix(".mp4"))
                    .unwrap();
                pairs[&JobId::from(id)].clone()
            })
            .collect()
    }
}

fn cdn(name: &str) -> String {
    format!("https://cdn.test/{}", name)
}

fn expected_pairs(photos: &[&str]) -> Vec<(String, String)> {
    photos.windows(2).map(|w| (cdn(w[0]), cdn(w[1]))).collect()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_three_photos_compose_two_clips_in_order() {
    let h = Harness::new(&["c.jpg", "a.jpg", "b.jpg"]);
    let (compositor, calls) = recording_compositor();

    let outcome = h.run(compositor).await.unwrap();

    assert_eq!(outcome.output_path, h.config.final_video_path);
    assert!(outcome.output_path.exists());

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        h.pairs_for(&calls[0]),
        vec![
            (cdn("a.jpg"), cdn("b.jpg")),
            (cdn("b.jpg"), cdn("c.jpg"))
        ]
    );

    let report = &outcome.report;
    assert_eq!(report.transitions.len(), 2);
    assert_eq!(report.successful_transitions(), 2);
    assert_eq!(report.transitions[0].sequence_index, SequenceIndex(0));
    assert_eq!(report.transitions[0].clip_path.as_ref(), Some(&calls[0][0]));
    assert!(h.config.report_path().exists());
}

#[tokio::test]
async fn test_submits_one_job_per_adjacent_pair() {
    let photos = ["p1.png", "p2.jpeg", "p3.gif", "p4.bmp", "p5.JPG"];
    let h = Harness::new(&photos);
    std::fs::write(h.photos_dir.join("readme.txt"), b"ignore me").unwrap();
    let (compositor, calls) = recording_compositor();

    h.run(compositor).await.unwrap();

    let mut submitted: Vec<(String, String)> = h
        .generator
        .submissions
        .lock()
        .unwrap()
        .iter()
        .map(|(prompt, a, b)| {
            assert_eq!(prompt, "zoom");
            (a.clone(), b.clone())
        })
        .collect();
    submitted.sort();

    assert_eq!(submitted, expected_pairs(&photos));
    assert_eq!(h.pairs_for(&calls.lock().unwrap()[0]), expected_pairs(&photos));
}

#[tokio::test]
async fn test_order_survives_random_completion_order() {
    let photos = ["01.jpg", "02.jpg", "03.jpg", "04.jpg", "05.jpg", "06.jpg", "07.jpg", "08.jpg"];

    for _ in 0..3 {
        let h = Harness::new(&photos);
        {
            // Earlier transitions take longer to finish
            let mut behaviours = h.generator.behaviours.lock().unwrap();
            for (i, name) in photos.iter().enumerate() {
                let extra = rand::rng().random_range(0..3);
                behaviours.insert(
                    name.to_string(),
                    Behaviour::CompleteAfter((photos.len() - i) as u32 + extra),
                );
            }
        }
        let (compositor, calls) = recording_compositor();

        h.run(compositor).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(h.pairs_for(&calls[0]), expected_pairs(&photos));
    }
}

#[tokio::test]
async fn test_single_photo_makes_no_calls() {
    let h = Harness::new(&["only.jpg"]);

    let err = h.run(unused_compositor()).await.unwrap_err();

    assert!(matches!(err, PipelineError::InsufficientInput { found: 1 }));
    assert_eq!(h.store.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.generator.submit_calls(), 0);
    assert_eq!(h.generator.polls.load(Ordering::SeqCst), 0);
    assert_eq!(h.downloader.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_directory_is_insufficient_input() {
    let h = Harness::new(&[]);
    let err = h.run(unused_compositor()).await.unwrap_err();
    assert!(matches!(err, PipelineError::InsufficientInput { found: 0 }));
}

#[tokio::test]
async fn test_failed_upload_skips_both_neighbouring_pairs() {
    let h = Harness::new(&["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);
    h.store.failing.lock().unwrap().insert("c.jpg".into());

    let err = h.run(unused_compositor()).await.unwrap_err();

    let submissions = h.generator.submissions.lock().unwrap().clone();
    assert_eq!(submissions.len(), 1);
    assert_eq!(
        (submissions[0].1.clone(), submissions[0].2.clone()),
        (cdn("a.jpg"), cdn("b.jpg"))
    );
    assert!(submissions
        .iter()
        .all(|(_, a, b)| !a.ends_with("c.jpg") && !b.ends_with("c.jpg")));

    let gaps = err.gaps();
    assert_eq!(gaps.len(), 2);
    assert_eq!(gaps[0].index, SequenceIndex(1));
    assert_eq!(gaps[1].index, SequenceIndex(2));
    assert!(gaps.iter().all(|g| g.phase == TransitionPhase::Upload));
    assert!(gaps.iter().all(|g| g.job_id.is_none()));
    assert!(gaps[0].reason.contains("c.jpg"));

    // The surviving transition still downloaded
    assert_eq!(h.downloader.attempts.load(Ordering::SeqCst), 1);
    assert!(!h.config.final_video_path.exists());
}

#[tokio::test]
async fn test_submission_failure_reports_gap_and_skips_composition() {
    let h = Harness::new(&["a.jpg", "b.jpg", "c.jpg"]);
    h.generator.rejected.lock().unwrap().insert("b.jpg".into());

    let err = h.run(unused_compositor()).await.unwrap_err();

    match &err {
        PipelineError::PartialFailure(failure) => {
            assert_eq!(failure.expected, 2);
            assert_eq!(failure.indices(), vec![SequenceIndex(1)]);
            assert_eq!(failure.gaps[0].phase, TransitionPhase::Submission);
            assert!(failure.gaps[0].job_id.is_none());
            assert!(failure.gaps[0].reason.contains("keyframe rejected"));
        }
        other => panic!("expected partial failure, got {:?}", other),
    }

    let report: serde_json::Value =
        serde_json::from_slice(&std::fs::read(h.config.report_path()).unwrap()).unwrap();
    assert_eq!(report["transitions"][1]["failed_phase"], "submission");
    assert!(report["transitions"][0]["clip_path"].is_string());
    assert!(report.get("output_path").is_none());
}

#[tokio::test]
async fn test_never_completing_job_times_out_without_blocking_others() {
    let mut h = Harness::new(&["a.jpg", "b.jpg", "c.jpg"]);
    h.config.poll.max_duration = Some(Duration::from_millis(150));
    h.generator
        .behaviours
        .lock()
        .unwrap()
        .insert("b.jpg".into(), Behaviour::Never);

    let err = h.run(unused_compositor()).await.unwrap_err();

    let gaps = err.gaps();
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].index, SequenceIndex(1));
    assert_eq!(gaps[0].phase, TransitionPhase::Polling);
    assert!(gaps[0].job_id.is_some());

    let clips: Vec<_> = std::fs::read_dir(&h.config.clips_directory)
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(clips.len(), 1);
}

#[tokio::test]
async fn test_completed_clip_downloads_while_other_job_still_polls() {
    let mut h = Harness::new(&["a.jpg", "b.jpg", "c.jpg"]);
    h.config.poll.max_duration = Some(Duration::from_millis(400));
    {
        let mut behaviours = h.generator.behaviours.lock().unwrap();
        behaviours.insert("a.jpg".into(), Behaviour::Never);
        behaviours.insert("b.jpg".into(), Behaviour::CompleteAfter(0));
    }

    let err = h.run(unused_compositor()).await.unwrap_err();
    assert_eq!(err.gaps()[0].index, SequenceIndex(0));

    let first_download = h
        .downloader
        .attempt_log
        .lock()
        .unwrap()
        .iter()
        .filter(|(source, _)| source == "b.jpg")
        .map(|(_, at)| *at)
        .min()
        .expect("completed clip was never downloaded");
    let last_poll = h
        .generator
        .poll_log
        .lock()
        .unwrap()
        .iter()
        .filter(|(source, _)| source == "a.jpg")
        .map(|(_, at)| *at)
        .max()
        .expect("pending job was never polled");

    assert!(
        first_download < last_poll,
        "download of index 1 waited for index 0 to stop polling"
    );
}

#[tokio::test]
async fn test_generation_failure_is_polling_gap() {
    let h = Harness::new(&["a.jpg", "b.jpg", "c.jpg"]);
    h.generator
        .behaviours
        .lock()
        .unwrap()
        .insert("a.jpg".into(), Behaviour::FailWith("400: unsafe content".into()));

    let err = h.run(unused_compositor()).await.unwrap_err();

    let gaps = err.gaps();
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].index, SequenceIndex(0));
    assert_eq!(gaps[0].phase, TransitionPhase::Polling);
    assert_eq!(gaps[0].reason, "400: unsafe content");
}

#[tokio::test]
async fn test_flaky_download_is_retried() {
    let h = Harness::new(&["a.jpg", "b.jpg"]);
    h.downloader.flaky.lock().unwrap().insert("a.jpg".into(), 1);
    let (compositor, calls) = recording_compositor();

    h.run(compositor).await.unwrap();

    assert_eq!(h.downloader.attempts.load(Ordering::SeqCst), 2);
    assert_eq!(calls.lock().unwrap()[0].len(), 1);
}

#[tokio::test]
async fn test_missing_download_is_not_retried() {
    let h = Harness::new(&["a.jpg", "b.jpg", "c.jpg"]);
    h.downloader.missing.lock().unwrap().insert("b.jpg".into());

    let err = h.run(unused_compositor()).await.unwrap_err();

    let gaps = err.gaps();
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].index, SequenceIndex(1));
    assert_eq!(gaps[0].phase, TransitionPhase::Download);
    assert!(gaps[0].reason.contains("404"));
    assert_eq!(h.downloader.attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_composition_failure_is_fatal() {
    let h = Harness::new(&["a.jpg", "b.jpg"]);
    let mut compositor = MockComp::new();
    compositor
        .expect_concatenate()
        .times(1)
        .returning(|_, _| Err(MediaError::InvalidVideo("corrupt clip".into())));

    let err = h.run(compositor).await.unwrap_err();

    assert!(matches!(err, PipelineError::Composition(_)));
    assert!(h.config.report_path().exists());
}

#[tokio::test]
async fn test_concurrency_ceiling_is_respected() {
    let photos = ["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg", "f.jpg", "g.jpg"];
    let mut h = Harness::new(&photos);
    h.config.max_concurrency = 2;
    let (compositor, _) = recording_compositor();

    h.run(compositor).await.unwrap();

    assert!(h.generator.submit_gauge.peak() <= 2);
    assert!(h.downloader.gauge.peak() <= 2);
    assert_eq!(h.generator.submit_calls(), photos.len() - 1);
}
