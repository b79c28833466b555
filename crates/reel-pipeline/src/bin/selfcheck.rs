use std::path::Path;
use std::process::Command;

use reel_pipeline::PipelineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = PipelineConfig::from_env()?;

    println!(
        "reel-selfcheck: starting with photos={} clips={}",
        config.photo_directory.display(),
        config.clips_directory.display()
    );
    ensure_dir(&config.clips_directory).await?;
    if let Some(parent) = config
        .final_video_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        ensure_dir(parent).await?;
    }
    ensure_tool("ffmpeg")?;
    ensure_tool("ffprobe")?;
    ensure_env_present(&[
        "STORAGE_ZONE_NAME",
        "API_KEY",
        "CDN_ENDPOINT",
        "LUMA_API_KEY",
    ])?;

    println!("reel-selfcheck: ok");
    Ok(())
}

async fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {}", path.display(), e))
}

fn ensure_tool(name: &str) -> anyhow::Result<()> {
    let output = Command::new(name)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("{} not available: {}", name, e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "{} -version failed: {:?}",
            name,
            output.status
        ));
    }
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).is_err() {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}
