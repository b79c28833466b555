//! Seams between the orchestrator and the outside world.
//!
//! The pipeline only talks to storage, the generation service, the network
//! and FFmpeg through these traits. Production wiring uses the clients from
//! the sibling crates; tests plug in fakes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use reel_gen_client::{GenResult, GenerationClient};
use reel_media::{ConcatCompositor, HttpDownloader, MediaResult};
use reel_models::{DownloadedClip, GenerationStatus, JobId};
use reel_storage::{EdgeStorageClient, StorageResult};

/// Uploads a local file and returns its public URL.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(&self, path: &Path) -> StorageResult<String>;
}

/// Remote keyframe-to-video generation.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Request a transition from `frame_a_url` to `frame_b_url`.
    async fn submit(&self, prompt: &str, frame_a_url: &str, frame_b_url: &str)
        -> GenResult<JobId>;

    /// Current status of a job. Must be safe to call repeatedly.
    async fn poll(&self, job_id: &JobId) -> GenResult<GenerationStatus>;
}

/// Fetches a finished clip into `dest_dir`.
#[async_trait]
pub trait ClipDownloader: Send + Sync {
    async fn download(&self, url: &str, dest_dir: &Path, job_id: &JobId) -> MediaResult<PathBuf>;
}

/// Joins clips, in the given order, into one video.
#[async_trait]
pub trait Compositor: Send + Sync {
    async fn concatenate(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()>;
}

/// The set of collaborators one pipeline runs against.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn AssetStore>,
    pub generator: Arc<dyn GenerationService>,
    pub downloader: Arc<dyn ClipDownloader>,
    pub compositor: Arc<dyn Compositor>,
}

#[async_trait]
impl AssetStore for EdgeStorageClient {
    async fn upload(&self, path: &Path) -> StorageResult<String> {
        self.upload_file(path).await
    }
}

#[async_trait]
impl GenerationService for GenerationClient {
    async fn submit(
        &self,
        prompt: &str,
        frame_a_url: &str,
        frame_b_url: &str,
    ) -> GenResult<JobId> {
        GenerationClient::submit(self, prompt, frame_a_url, frame_b_url).await
    }

    async fn poll(&self, job_id: &JobId) -> GenResult<GenerationStatus> {
        GenerationClient::poll(self, job_id).await
    }
}

#[async_trait]
impl ClipDownloader for HttpDownloader {
    async fn download(&self, url: &str, dest_dir: &Path, job_id: &JobId) -> MediaResult<PathBuf> {
        HttpDownloader::download(self, url, dest_dir, &DownloadedClip::file_name_for(job_id)).await
    }
}

#[async_trait]
impl Compositor for ConcatCompositor {
    async fn concatenate(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()> {
        ConcatCompositor::concatenate(self, clips, output).await
    }
}
