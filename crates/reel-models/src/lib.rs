//! Shared data models for the Reelgen transition pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Photo sets and their adjacent pairs
//! - Transition jobs and their terminal states
//! - Downloaded clips
//! - Run reports

pub mod clip;
pub mod job;
pub mod photo;
pub mod report;

// Re-export common types
pub use clip::DownloadedClip;
pub use job::{GenerationStatus, JobId, JobState, SequenceIndex, TransitionJob};
pub use photo::{is_supported_image, photo_name, PhotoPair, PhotoSet, SUPPORTED_IMAGE_EXTENSIONS};
pub use report::{RunId, RunReport, TransitionPhase, TransitionReport, UploadReport};
