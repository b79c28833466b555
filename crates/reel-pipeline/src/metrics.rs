//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! these calls are no-ops.

use std::time::Duration;

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Photo uploads by status (`ok` / `failed`).
    pub const UPLOADS_TOTAL: &str = "reel_uploads_total";

    /// Expected transitions by outcome (`completed` or the failing phase).
    pub const TRANSITIONS_TOTAL: &str = "reel_transitions_total";

    /// Poll requests sent to the generation service.
    pub const POLL_ATTEMPTS_TOTAL: &str = "reel_poll_attempts_total";

    /// Wall time of each pipeline phase in seconds.
    pub const PHASE_DURATION_SECONDS: &str = "reel_phase_duration_seconds";
}

pub fn record_upload(success: bool) {
    let status = if success { "ok" } else { "failed" };
    counter!(names::UPLOADS_TOTAL, "status" => status).increment(1);
}

pub fn record_transition(outcome: &'static str) {
    counter!(names::TRANSITIONS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_poll_attempt() {
    counter!(names::POLL_ATTEMPTS_TOTAL).increment(1);
}

pub fn record_phase_duration(phase: &'static str, elapsed: Duration) {
    histogram!(names::PHASE_DURATION_SECONDS, "phase" => phase).record(elapsed.as_secs_f64());
}
