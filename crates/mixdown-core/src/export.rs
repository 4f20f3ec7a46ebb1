use std::{fs, path::Path};

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::{
    model::StereoBuffer,
    wav::{self, WavInfo},
};

#[instrument(skip(bytes), fields(path = %path.display(), bytes = bytes.len()))]
pub fn write_wav_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create wav output directory: {}",
                parent.display()
            )
        })?;
    }

    fs::write(path, bytes)
        .with_context(|| format!("failed to write wav file: {}", path.display()))?;
    info!("wav export completed");
    Ok(())
}

#[instrument(skip(buffer), fields(path = %path.display(), samples = buffer.len()))]
pub fn write_stereo_wav(path: &Path, buffer: &StereoBuffer) -> Result<()> {
    write_wav_bytes(path, &wav::encode_stereo(buffer))
}

#[instrument(skip(samples), fields(path = %path.display(), samples = samples.len()))]
pub fn write_mono_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    write_wav_bytes(path, &wav::encode_mono(samples, sample_rate))
}

#[instrument(fields(path = %path.display()))]
pub fn inspect_wav(path: &Path) -> Result<WavInfo> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read wav file: {}", path.display()))?;
    wav::inspect(&bytes).with_context(|| format!("failed to parse wav file: {}", path.display()))
}
