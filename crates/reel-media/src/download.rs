//! Streaming HTTP download of generated clips.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{ensure_dir, finalize_part, part_path, remove_if_exists};

/// Configuration for the clip downloader.
#[derive(Debug, Clone)]
pub struct HttpDownloaderConfig {
    /// Whole-request timeout (connect + body)
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpDownloaderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            connect_timeout: Duration::from_secs(15),
        }
    }
}

/// Downloads a URL to a local file.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    http: Client,
}

impl HttpDownloader {
    pub fn new(config: HttpDownloaderConfig) -> MediaResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| MediaError::download_failed(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    /// Stream `url` into `dest_dir/file_name` and return the final path.
    ///
    /// Only `200 OK` is accepted. The body is written to a `.part` file that
    /// is renamed into place after the last chunk, and removed on any error.
    pub async fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        file_name: &str,
    ) -> MediaResult<PathBuf> {
        ensure_dir(dest_dir).await?;
        let dest = dest_dir.join(file_name);
        let part = part_path(&dest);

        debug!("Downloading {} to {}", url, dest.display());

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::download_failed(format!("request to {} failed: {}", url, e)))?;

        if response.status() != StatusCode::OK {
            return Err(MediaError::download_status(response.status().as_u16(), url));
        }

        match write_body(response, &part).await {
            Ok(bytes) => {
                finalize_part(&part, &dest).await?;
                info!("Downloaded {} bytes to {}", bytes, dest.display());
                Ok(dest)
            }
            Err(e) => {
                remove_if_exists(&part).await;
                Err(e)
            }
        }
    }
}

async fn write_body(response: reqwest::Response, part: &Path) -> MediaResult<u64> {
    let mut file = tokio::fs::File::create(part).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| MediaError::download_failed(format!("body stream error: {}", e)))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn downloader() -> HttpDownloader {
        HttpDownloader::new(HttpDownloaderConfig {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start().await;
        let body = vec![7u8; 64 * 1024];
        Mock::given(method("GET"))
            .and(path("/videos/gen-1.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("generated");
        let url = format!("{}/videos/gen-1.mp4", server.uri());

        let local = downloader()
            .download(&url, &out_dir, "transition_gen-1.mp4")
            .await
            .unwrap();

        assert_eq!(local, out_dir.join("transition_gen-1.mp4"));
        assert_eq!(tokio::fs::read(&local).await.unwrap(), body);
        assert!(!part_path(&local).exists());
    }

    #[tokio::test]
    async fn test_download_non_200_fails_without_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/missing.mp4", server.uri());

        let err = downloader()
            .download(&url, dir.path(), "transition_x.mp4")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MediaError::DownloadFailed {
                status: Some(404),
                ..
            }
        ));
        assert!(!dir.path().join("transition_x.mp4").exists());
    }

    #[tokio::test]
    async fn test_download_rejects_other_success_codes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = downloader()
            .download(&server.uri(), dir.path(), "c.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::DownloadFailed { status: Some(204), .. }));
    }
}
