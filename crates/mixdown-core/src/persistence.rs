use std::{fs, io::Write, path::Path};

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::model::Track;

#[instrument(skip(track), fields(events = track.events.len(), path = %path.display()))]
pub fn save_track(path: &Path, track: &Track) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_vec_pretty(track).context("failed to serialize track")?;
    let mut temp_file = tempfile::NamedTempFile::new_in(
        path.parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| Path::new(".").to_path_buf(), Path::to_path_buf),
    )
    .context("failed to create temp track file")?;

    temp_file
        .write_all(&json)
        .context("failed to write temp track file")?;
    temp_file
        .persist(path)
        .map_err(|error| anyhow::anyhow!(error.error))
        .with_context(|| format!("failed to persist track: {}", path.display()))?;

    info!("track saved");
    Ok(())
}

#[instrument(fields(path = %path.display()))]
pub fn load_track(path: &Path) -> Result<Track> {
    let content =
        fs::read(path).with_context(|| format!("failed to read track: {}", path.display()))?;
    let track: Track = serde_json::from_slice(&content).context("invalid track json")?;
    info!(events = track.events.len(), "track loaded");
    Ok(track)
}
