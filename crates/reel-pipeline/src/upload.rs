//! Upload phase.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use reel_models::{photo_name, PhotoSet, UploadReport};

use crate::collaborators::AssetStore;
use crate::metrics;

/// Upload every photo with at most `max_concurrency` uploads in flight.
///
/// The result has one entry per photo, in photo order. A failed upload keeps
/// its slot with `url: None` so later pairing can see the hole.
pub async fn upload_all(
    store: Arc<dyn AssetStore>,
    photos: &PhotoSet,
    max_concurrency: usize,
) -> Vec<UploadReport> {
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));

    let uploads = photos.photos().iter().map(|path| {
        let store = Arc::clone(&store);
        let semaphore = Arc::clone(&semaphore);
        async move {
            let _permit = semaphore.acquire().await;
            let result = store.upload(path).await;
            metrics::record_upload(result.is_ok());

            match result {
                Ok(url) => {
                    info!(photo = %photo_name(path), url = %url, "Uploaded photo");
                    UploadReport {
                        photo: path.clone(),
                        url: Some(url),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(photo = %photo_name(path), "Upload failed: {}", e);
                    UploadReport {
                        photo: path.clone(),
                        url: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        }
    });

    // join_all keeps input order regardless of completion order
    join_all(uploads).await
}
