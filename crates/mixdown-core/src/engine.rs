use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    export,
    mix::{mix_track, mix_track_mono},
    model::{DEFAULT_FPS, DEFAULT_SAMPLE_RATE, StereoBuffer, Track},
    wav,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("sample rate must be positive, got {0}")]
    InvalidSampleRate(u32),
    #[error("sample rate {0} Hz is too high for a 16-bit stereo WAV byte rate")]
    UnsupportedSampleRate(u32),
    #[error("frames per second must be positive, got {0}")]
    InvalidFps(u32),
    #[error("tempo must be a positive number of beats per minute, got {0}")]
    InvalidTempo(f64),
    #[error("track needs at least one beat per bar and one tick per quarter note")]
    InvalidMeter,
    #[error("event {index}: filter Q must be positive, got {q}")]
    InvalidFilterQ { index: usize, q: f64 },
    #[error("compressor ratio must be positive, got {0}")]
    InvalidCompressorRatio(f64),
    #[error("io error: {0}")]
    Io(String),
}

impl From<anyhow::Error> for EngineError {
    fn from(value: anyhow::Error) -> Self {
        Self::Io(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelLayout {
    Stereo,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub sample_rate: u32,
    pub fps: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            fps: DEFAULT_FPS,
        }
    }
}

/// Validating front door over the mixer and encoder.
///
/// The DSP stages assume well-formed input; this checks the numeric
/// preconditions first and reports them as [`EngineError`].
#[derive(Debug, Clone, Default)]
pub struct Engine {
    settings: RenderSettings,
}

impl Engine {
    #[must_use]
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> RenderSettings {
        self.settings
    }

    pub fn validate(&self, track: &Track) -> Result<(), EngineError> {
        if self.settings.sample_rate == 0 {
            return Err(EngineError::InvalidSampleRate(self.settings.sample_rate));
        }
        if self
            .settings
            .sample_rate
            .checked_mul(u32::from(wav::STEREO_BLOCK_ALIGN))
            .is_none()
        {
            return Err(EngineError::UnsupportedSampleRate(self.settings.sample_rate));
        }
        if self.settings.fps == 0 {
            return Err(EngineError::InvalidFps(self.settings.fps));
        }
        if !(track.bpm.is_finite() && track.bpm > 0.0) {
            return Err(EngineError::InvalidTempo(track.bpm));
        }
        if track.beats_per_bar == 0 || track.ticks_per_quarter == 0 {
            return Err(EngineError::InvalidMeter);
        }
        for (index, event) in track.events.iter().enumerate() {
            if let Some(filter) = event.filter.filter(|filter| filter.q <= 0.0) {
                return Err(EngineError::InvalidFilterQ { index, q: filter.q });
            }
        }
        if let Some(compressor) = track.compressor.filter(|spec| spec.ratio <= 0.0) {
            return Err(EngineError::InvalidCompressorRatio(compressor.ratio));
        }
        Ok(())
    }

    #[instrument(skip(self, track), fields(events = track.events.len()))]
    pub fn render_stereo(
        &self,
        track: &Track,
        total_frames: u32,
    ) -> Result<StereoBuffer, EngineError> {
        self.validate(track)?;
        Ok(mix_track(
            track,
            total_frames,
            self.settings.fps,
            self.settings.sample_rate,
        ))
    }

    #[instrument(skip(self, track), fields(events = track.events.len()))]
    pub fn render_mono(&self, track: &Track, total_frames: u32) -> Result<Vec<f32>, EngineError> {
        self.validate(track)?;
        Ok(mix_track_mono(
            track,
            total_frames,
            self.settings.fps,
            self.settings.sample_rate,
        ))
    }

    pub fn render_wav(
        &self,
        track: &Track,
        total_frames: u32,
        layout: ChannelLayout,
    ) -> Result<Vec<u8>, EngineError> {
        let bytes = match layout {
            ChannelLayout::Stereo => wav::encode_stereo(&self.render_stereo(track, total_frames)?),
            ChannelLayout::Mono => wav::encode_mono(
                &self.render_mono(track, total_frames)?,
                self.settings.sample_rate,
            ),
        };
        Ok(bytes)
    }

    #[instrument(skip(self, track), fields(layout = ?layout, path = %output_path.display()))]
    pub fn export(
        &self,
        track: &Track,
        total_frames: u32,
        layout: ChannelLayout,
        output_path: &Path,
    ) -> Result<(), EngineError> {
        let bytes = self.render_wav(track, total_frames, layout)?;
        export::write_wav_bytes(output_path, &bytes)?;
        info!(bytes = bytes.len(), "track exported");
        Ok(())
    }
}
