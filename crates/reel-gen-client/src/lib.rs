//! Client for the remote generation service.
//!
//! Submits keyframe-to-video generations (a prompt plus a start and end
//! frame) and polls them until a video URL is available.

pub mod client;
pub mod error;
pub mod types;

pub use client::{GenerationClient, GenerationClientConfig};
pub use error::{GenError, GenResult};
pub use types::{Assets, CreateGenerationRequest, Generation, Keyframe, Keyframes};
