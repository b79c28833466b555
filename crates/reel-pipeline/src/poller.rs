//! Bounded polling of one generation job.

use tokio::time::Instant;

use reel_models::{JobState, TransitionJob};

use crate::collaborators::GenerationService;
use crate::config::PollConfig;
use crate::logging::TransitionLogger;
use crate::metrics;
use crate::retry::FailureTracker;

/// Poll `job` until it reaches a terminal state.
///
/// The job ends `Completed` or `Failed` as reported by the service, `Failed`
/// after `max_consecutive_errors` transport errors in a row, or `TimedOut`
/// once `max_duration` has elapsed. Polls are spaced by a fixed interval.
pub async fn poll_until_terminal(
    service: &dyn GenerationService,
    job: &mut TransitionJob,
    config: &PollConfig,
    logger: &TransitionLogger,
) {
    let started = Instant::now();
    let deadline = config.max_duration.map(|d| started + d);
    let mut errors = FailureTracker::new(config.max_consecutive_errors);

    while !job.is_terminal() {
        metrics::record_poll_attempt();

        match service.poll(&job.job_id).await {
            Ok(status) => {
                errors.record_success();
                job.record_poll(&status);
                if job.is_terminal() {
                    break;
                }
            }
            Err(e) => {
                if errors.record_failure() {
                    logger.log_warning(&format!(
                        "poll error {}/{}: {}",
                        errors.failure_count(),
                        config.max_consecutive_errors,
                        e
                    ));
                }
                if errors.failure_count() >= config.max_consecutive_errors {
                    job.fail(format!(
                        "{} consecutive poll errors, last: {}",
                        errors.failure_count(),
                        e
                    ));
                    break;
                }
            }
        }

        if let Some(deadline) = deadline {
            let now = Instant::now();
            if now >= deadline {
                job.time_out(now.duration_since(started).as_secs());
                break;
            }
        }

        tokio::time::sleep(config.interval).await;
    }

    match &job.state {
        JobState::Completed { result_url } => {
            logger.log_progress(&format!(
                "generation completed after {} polls: {}",
                job.poll_attempts, result_url
            ));
        }
        JobState::Failed { reason } => logger.log_error(&format!("generation failed: {}", reason)),
        JobState::TimedOut { waited_secs } => {
            logger.log_error(&format!("gave up polling after {}s", waited_secs))
        }
        _ => {}
    }
}
