//! Photo-to-transition video pipeline binary.
//!
//! Usage: `reel-pipeline [PROMPT]`. Everything else comes from the
//! environment (or a `.env` file).

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_pipeline::{Pipeline, PipelineConfig, PipelineError};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting reel-pipeline");

    let config = match PipelineConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };
    info!("Pipeline config: {:?}", config);

    let prompt = std::env::args()
        .nth(1)
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| config.prompt.clone());
    let photo_directory = config.photo_directory.clone();

    let pipeline = match Pipeline::from_env(config) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to create pipeline: {}", e);
            std::process::exit(2);
        }
    };

    match pipeline.run(&photo_directory, &prompt).await {
        Ok(outcome) => {
            info!(
                run_id = %outcome.report.run_id,
                transitions = outcome.report.successful_transitions(),
                "Final video saved to {}",
                outcome.output_path.display()
            );
        }
        Err(PipelineError::PartialFailure(failure)) => {
            error!(
                missing = failure.gaps.len(),
                expected = failure.expected,
                "No video produced, transitions missing: {:?}",
                failure.indices().iter().map(|i| i.get()).collect::<Vec<_>>()
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Colored output for dev, JSON when `LOG_FORMAT=json`.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reel=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}
