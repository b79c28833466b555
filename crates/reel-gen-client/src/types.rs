//! Generation API request/response types.

use serde::{Deserialize, Serialize};

use reel_models::GenerationStatus;

/// A keyframe reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Always `"image"` for photo keyframes
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

impl Keyframe {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: "image".to_string(),
            url: url.into(),
        }
    }
}

/// Start (`frame0`) and end (`frame1`) frames of a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyframes {
    pub frame0: Keyframe,
    pub frame1: Keyframe,
}

/// Request body for creating a generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGenerationRequest {
    pub prompt: String,
    pub keyframes: Keyframes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}

impl CreateGenerationRequest {
    pub fn transition(
        prompt: impl Into<String>,
        frame_a_url: impl Into<String>,
        frame_b_url: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            keyframes: Keyframes {
                frame0: Keyframe::image(frame_a_url),
                frame1: Keyframe::image(frame_b_url),
            },
            aspect_ratio: None,
        }
    }
}

/// Output assets of a generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assets {
    #[serde(default)]
    pub video: Option<String>,
}

/// Generation resource as returned by create and get calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub id: String,
    /// `queued`, `dreaming`, `completed` or `failed`
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub assets: Option<Assets>,
}

impl Generation {
    /// Collapse the resource into a poll status.
    ///
    /// A video asset wins over the state string: the service may report the
    /// asset before flipping `state`.
    pub fn status(&self) -> GenerationStatus {
        if let Some(video) = self.assets.as_ref().and_then(|a| a.video.as_ref()) {
            if !video.is_empty() {
                return GenerationStatus::Completed {
                    video_url: video.clone(),
                };
            }
        }

        match self.state.as_deref() {
            Some("failed") => GenerationStatus::Failed {
                reason: self
                    .failure_reason
                    .clone()
                    .unwrap_or_else(|| "generation failed".to_string()),
            },
            _ => GenerationStatus::Pending,
        }
    }
}
