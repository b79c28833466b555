//! Photo discovery.

use std::path::Path;

use tracing::{debug, info, warn};

use reel_models::{is_supported_image, PhotoSet};

use crate::error::PipelineResult;

/// List the supported images directly inside `dir`, sorted by file name.
///
/// Symlinks are followed. Subdirectories, other non-files and dangling links
/// are skipped; nothing is recursed into.
pub async fn collect_photos(dir: &Path) -> PipelineResult<PhotoSet> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut photos = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        }
        if is_supported_image(&path) {
            photos.push(path);
        } else {
            debug!(path = %path.display(), "Skipping non-image file");
        }
    }

    let set = PhotoSet::sorted_by_name(photos);
    info!(
        directory = %dir.display(),
        photos = set.len(),
        "Collected photos"
    );
    Ok(set)
}
