//! Filesystem helpers for writing files in place safely.
//!
//! Downloads and renders are written to a `.part` sibling first and renamed
//! into place once complete, so a crash never leaves a truncated file at the
//! final path.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Create a directory (and parents) if it does not exist yet.
pub async fn ensure_dir(path: impl AsRef<Path>) -> MediaResult<()> {
    let path = path.as_ref();
    if fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Ok(());
    }
    fs::create_dir_all(path).await?;
    Ok(())
}

/// Temporary sibling path used while a file is being written.
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Rename a finished `.part` file onto its destination.
///
/// The partial file is removed if the rename fails.
pub async fn finalize_part(part: &Path, dst: &Path) -> MediaResult<()> {
    if let Err(e) = fs::rename(part, dst).await {
        tracing::error!(
            "Failed to move {} into place at {}: {}",
            part.display(),
            dst.display(),
            e
        );
        remove_if_exists(part).await;
        return Err(MediaError::from(e));
    }
    Ok(())
}

/// Best-effort removal; missing files are not an error.
pub async fn remove_if_exists(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}
