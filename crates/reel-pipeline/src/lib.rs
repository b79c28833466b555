//! Photo-to-transition video pipeline.
//!
//! Uploads a directory of photos, asks the generation service for a clip
//! between every adjacent pair, downloads the clips and concatenates them in
//! photo order.

pub mod assembler;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod photos;
pub mod poller;
pub mod report;
pub mod retry;
pub mod upload;
pub mod worker;

pub use assembler::ClipAssembler;
pub use collaborators::{AssetStore, ClipDownloader, Collaborators, Compositor, GenerationService};
pub use config::{PipelineConfig, PollConfig, DEFAULT_PROMPT};
pub use error::{PartialPipelineFailure, PipelineError, PipelineResult, TransitionGap};
pub use logging::TransitionLogger;
pub use orchestrator::{Pipeline, RunOutcome};
pub use photos::collect_photos;
pub use poller::poll_until_terminal;
pub use report::write_report;
pub use retry::{retry_async, FailureTracker, RetryConfig};
pub use upload::upload_all;
pub use worker::{run_transition, PhaseLimits, TransitionEvent, TransitionTask, WorkerContext};
