//! Photo set models.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::job::SequenceIndex;

/// File extensions recognised as input images (compared case-insensitively).
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Check whether a path has one of the supported image extensions.
pub fn is_supported_image(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Ordered sequence of local photos.
///
/// Order is meaningful: photo `i` and photo `i + 1` become transition `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSet {
    photos: Vec<PathBuf>,
}

impl PhotoSet {
    /// Build a photo set from paths already in their final order.
    pub fn new(photos: Vec<PathBuf>) -> Self {
        Self { photos }
    }

    /// Build a photo set sorted by file name.
    pub fn sorted_by_name(mut photos: Vec<PathBuf>) -> Self {
        photos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Self { photos }
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn photos(&self) -> &[PathBuf] {
        &self.photos
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.photos.get(index).map(PathBuf::as_path)
    }

    /// Number of transitions this set produces (`len - 1`, or 0).
    pub fn transition_count(&self) -> usize {
        self.photos.len().saturating_sub(1)
    }

    /// Iterate over adjacent pairs in order.
    pub fn pairs(&self) -> impl Iterator<Item = PhotoPair<'_>> {
        self.photos
            .windows(2)
            .enumerate()
            .map(|(i, w)| PhotoPair {
                index: SequenceIndex(i),
                source: &w[0],
                target: &w[1],
            })
    }
}

/// Two adjacent photos and the transition index they produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoPair<'a> {
    pub index: SequenceIndex,
    pub source: &'a Path,
    pub target: &'a Path,
}

/// Display name of a photo (its file name), used in logs and reports.
pub fn photo_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
