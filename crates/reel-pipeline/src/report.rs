//! Run report persistence.

use std::path::Path;

use tracing::info;

use reel_models::RunReport;

use crate::error::PipelineResult;

/// Write `report` as pretty JSON to `path`, creating parent directories.
pub async fn write_report(report: &RunReport, path: &Path) -> PipelineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_vec_pretty(report).map_err(std::io::Error::other)?;
    tokio::fs::write(path, json).await?;

    info!(
        run_id = %report.run_id,
        path = %path.display(),
        "Run report written"
    );
    Ok(())
}
