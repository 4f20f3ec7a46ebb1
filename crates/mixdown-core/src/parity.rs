use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::{
    engine::{ChannelLayout, Engine, RenderSettings},
    model::Track,
};

const PARITY_SCHEMA_VERSION: u32 = 1;

/// Fingerprint of one render, used to catch drift in the synthesis output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParityReport {
    pub schema_version: u32,
    pub event_count: usize,
    pub sample_rate: u32,
    pub fps: u32,
    pub total_frames: u32,
    pub stereo_bytes: usize,
    pub track_hash: String,
    pub stereo_hash: String,
    pub mono_hash: String,
}

#[instrument(skip(track), fields(events = track.events.len()))]
pub fn generate_parity_report(
    track: &Track,
    settings: RenderSettings,
    total_frames: u32,
) -> Result<ParityReport> {
    let track_bytes = serde_json::to_vec(track).context("failed to serialize track")?;
    let engine = Engine::new(settings);
    let stereo = engine
        .render_wav(track, total_frames, ChannelLayout::Stereo)
        .context("stereo render failed")?;
    let mono = engine
        .render_wav(track, total_frames, ChannelLayout::Mono)
        .context("mono render failed")?;

    Ok(ParityReport {
        schema_version: PARITY_SCHEMA_VERSION,
        event_count: track.events.len(),
        sample_rate: settings.sample_rate,
        fps: settings.fps,
        total_frames,
        stereo_bytes: stereo.len(),
        track_hash: hash_hex(&track_bytes),
        stereo_hash: hash_hex(&stereo),
        mono_hash: hash_hex(&mono),
    })
}

pub fn read_parity_report(path: &Path) -> Result<ParityReport> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read parity report: {}", path.display()))?;
    let report: ParityReport =
        serde_json::from_slice(&bytes).context("failed to parse parity report json")?;
    Ok(report)
}

pub fn write_parity_report(path: &Path, report: &ParityReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parity directory: {}", parent.display()))?;
    }

    let json = serde_json::to_vec_pretty(report).context("failed to encode parity report json")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write parity report: {}", path.display()))?;
    Ok(())
}

fn hash_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{digest:x}")
}
