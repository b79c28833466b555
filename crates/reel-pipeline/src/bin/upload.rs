//! Upload every photo in a directory and print the resulting CDN URLs.
//!
//! Usage: `reel-upload [DIRECTORY]`, defaulting to `PHOTO_DIRECTORY`.

use std::path::PathBuf;
use std::sync::Arc;

use reel_models::photo_name;
use reel_pipeline::{collect_photos, upload_all, PipelineConfig};
use reel_storage::EdgeStorageClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    dotenvy::dotenv().ok();

    let config = PipelineConfig::from_env()?;
    let directory = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or(config.photo_directory);

    let store = EdgeStorageClient::from_env()?;
    let photos = collect_photos(&directory).await?;
    let reports = upload_all(Arc::new(store), &photos, config.max_concurrency).await;

    let mut failed = 0;
    for report in &reports {
        match (&report.url, &report.error) {
            (Some(url), _) => println!("{}", url),
            (None, error) => {
                failed += 1;
                eprintln!(
                    "reel-upload: {} failed: {}",
                    photo_name(&report.photo),
                    error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} uploads failed", failed, reports.len());
    }
    Ok(())
}
