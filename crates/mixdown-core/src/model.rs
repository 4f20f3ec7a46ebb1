use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{BarBeatTick, Tempo};

pub const DEFAULT_BPM: f64 = 120.0;
pub const DEFAULT_BEATS_PER_BAR: u32 = 4;
pub const DEFAULT_TICKS_PER_QUARTER: u32 = 480;
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_FPS: u32 = 30;
pub const DEFAULT_FREQUENCY_HZ: f64 = 440.0;
pub const DEFAULT_FILTER_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;
pub const DEFAULT_ROOM_SIZE: f64 = 0.5;
pub const DEFAULT_DAMPING: f64 = 0.5;

/// Wall-clock duration used by envelope stages and effect ballistics.
///
/// Kept distinct from [`Length`], which is expressed in video frames or
/// musical beats.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seconds(pub f64);

impl Seconds {
    pub const ZERO: Self = Self(0.0);

    #[must_use]
    pub fn to_samples(self, sample_rate: u32) -> f64 {
        self.0 * f64::from(sample_rate)
    }
}

/// The top-level render input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    #[serde(default = "default_beats_per_bar")]
    pub beats_per_bar: u32,
    #[serde(default = "default_ticks_per_quarter")]
    pub ticks_per_quarter: u32,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverb: Option<ReverbSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressor: Option<CompressorSpec>,
}

impl Default for Track {
    fn default() -> Self {
        Self::new(DEFAULT_BPM)
    }
}

impl Track {
    #[must_use]
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            beats_per_bar: DEFAULT_BEATS_PER_BAR,
            ticks_per_quarter: DEFAULT_TICKS_PER_QUARTER,
            events: Vec::new(),
            reverb: None,
            compressor: None,
        }
    }

    #[must_use]
    pub fn tempo(&self) -> Tempo {
        Tempo {
            bpm: self.bpm,
            beats_per_bar: self.beats_per_bar,
            ticks_per_quarter: self.ticks_per_quarter,
        }
    }
}

/// Where an event starts. Frame positions may be fractional and are rounded
/// when resolved to samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    Frame(f64),
    Bbt(BarBeatTick),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Frames(f64),
    /// Beat duration, with the frame duration it shadowed so the event can
    /// still be sized when rendered without a tempo.
    Beats {
        beats: f64,
        fallback_frames: Option<f64>,
    },
}

impl Length {
    #[must_use]
    pub fn beats(beats: f64) -> Self {
        Self::Beats {
            beats,
            fallback_frames: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Saw,
    Triangle,
    Noise,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelope {
    pub attack: Seconds,
    pub decay: Seconds,
    /// Fraction of full level held after attack and decay, 0..1.
    pub sustain: f64,
    pub release: Seconds,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: Seconds::ZERO,
            decay: Seconds::ZERO,
            sustain: 1.0,
            release: Seconds::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Lowpass,
    Highpass,
    Bandpass,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub cutoff_hz: f64,
    #[serde(default = "default_filter_q")]
    pub q: f64,
}

impl FilterSpec {
    #[must_use]
    pub fn new(kind: FilterKind, cutoff_hz: f64) -> Self {
        Self {
            kind,
            cutoff_hz,
            q: DEFAULT_FILTER_Q,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverbSpec {
    pub wet: f64,
    #[serde(default = "default_room_size")]
    pub room_size: f64,
    #[serde(default = "default_damping")]
    pub damping: f64,
}

impl ReverbSpec {
    #[must_use]
    pub fn new(wet: f64) -> Self {
        Self {
            wet,
            room_size: DEFAULT_ROOM_SIZE,
            damping: DEFAULT_DAMPING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorSpec {
    pub threshold_db: f64,
    pub ratio: f64,
    /// Knee width in dB; zero is a hard knee.
    pub knee_db: f64,
    pub attack: Seconds,
    pub release: Seconds,
    pub makeup_gain_db: f64,
}

impl Default for CompressorSpec {
    fn default() -> Self {
        Self {
            threshold_db: -24.0,
            ratio: 4.0,
            knee_db: 0.0,
            attack: Seconds(0.003),
            release: Seconds(0.25),
            makeup_gain_db: 0.0,
        }
    }
}

/// One procedurally synthesized sound.
///
/// On the wire an event may carry both a frame and a bar/beat/tick position,
/// and both a frame and a beat duration. Bar/beat/tick wins over the frame,
/// and the beat duration wins over the frame duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EventRecord", into = "EventRecord")]
pub struct Event {
    pub position: Position,
    pub length: Length,
    pub frequency_hz: f64,
    pub waveform: Waveform,
    /// Frequency reached at the end of the event by a linear slide.
    pub slide_to_hz: Option<f64>,
    pub envelope: Envelope,
    pub volume: f64,
    pub distortion: f64,
    pub filter: Option<FilterSpec>,
    /// -1 hard left, +1 hard right.
    pub pan: f64,
}

impl Event {
    #[must_use]
    pub fn new(position: Position, length: Length) -> Self {
        Self {
            position,
            length,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            waveform: Waveform::Sine,
            slide_to_hz: None,
            envelope: Envelope::default(),
            volume: 1.0,
            distortion: 0.0,
            filter: None,
            pan: 0.0,
        }
    }

    #[must_use]
    pub fn at_frame(frame: i64, duration_frames: u32) -> Self {
        Self::new(
            Position::Frame(frame as f64),
            Length::Frames(f64::from(duration_frames)),
        )
    }

    #[must_use]
    pub fn at_bbt(bar: u32, beat: u32, tick: u32, duration_beats: f64) -> Self {
        Self::new(
            Position::Bbt(BarBeatTick { bar, beat, tick }),
            Length::beats(duration_beats),
        )
    }

    #[must_use]
    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    #[must_use]
    pub fn with_frequency(mut self, frequency_hz: f64) -> Self {
        self.frequency_hz = frequency_hz;
        self
    }

    #[must_use]
    pub fn with_slide_to(mut self, slide_to_hz: f64) -> Self {
        self.slide_to_hz = Some(slide_to_hz);
        self
    }

    #[must_use]
    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    #[must_use]
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    #[must_use]
    pub fn with_distortion(mut self, distortion: f64) -> Self {
        self.distortion = distortion;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_pan(mut self, pan: f64) -> Self {
        self.pan = pan;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frame: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bar: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    beat: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tick: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration_frames: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration_beats: Option<f64>,
    #[serde(default = "default_frequency_hz")]
    frequency_hz: f64,
    #[serde(default)]
    waveform: Waveform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    slide_to_hz: Option<f64>,
    #[serde(flatten)]
    envelope: Envelope,
    #[serde(default = "default_volume")]
    volume: f64,
    #[serde(default)]
    distortion: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<FilterSpec>,
    #[serde(default)]
    pan: f64,
}

impl From<EventRecord> for Event {
    fn from(record: EventRecord) -> Self {
        let position = if record.bar.is_some() || record.beat.is_some() || record.tick.is_some() {
            Position::Bbt(BarBeatTick {
                bar: record.bar.unwrap_or_default(),
                beat: record.beat.unwrap_or_default(),
                tick: record.tick.unwrap_or_default(),
            })
        } else {
            Position::Frame(record.frame.unwrap_or_default())
        };

        let length = match record.duration_beats {
            Some(beats) => Length::Beats {
                beats,
                fallback_frames: record.duration_frames,
            },
            None => Length::Frames(record.duration_frames.unwrap_or_default()),
        };

        Self {
            position,
            length,
            frequency_hz: record.frequency_hz,
            waveform: record.waveform,
            slide_to_hz: record.slide_to_hz,
            envelope: record.envelope,
            volume: record.volume,
            distortion: record.distortion,
            filter: record.filter,
            pan: record.pan,
        }
    }
}

impl From<Event> for EventRecord {
    fn from(event: Event) -> Self {
        let (frame, bbt) = match event.position {
            Position::Frame(frame) => (Some(frame), None),
            Position::Bbt(bbt) => (None, Some(bbt)),
        };
        let (duration_frames, duration_beats) = match event.length {
            Length::Frames(frames) => (Some(frames), None),
            Length::Beats {
                beats,
                fallback_frames,
            } => (fallback_frames, Some(beats)),
        };

        Self {
            frame,
            bar: bbt.map(|bbt| bbt.bar),
            beat: bbt.map(|bbt| bbt.beat),
            tick: bbt.map(|bbt| bbt.tick),
            duration_frames,
            duration_beats,
            frequency_hz: event.frequency_hz,
            waveform: event.waveform,
            slide_to_hz: event.slide_to_hz,
            envelope: event.envelope,
            volume: event.volume,
            distortion: event.distortion,
            filter: event.filter,
            pan: event.pan,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("channel length mismatch: left has {left} samples, right has {right}")]
    ChannelLengthMismatch { left: usize, right: usize },
}

/// Two equal-length channels at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoBuffer {
    left: Vec<f32>,
    right: Vec<f32>,
    sample_rate: u32,
}

impl StereoBuffer {
    #[must_use]
    pub fn silent(len: usize, sample_rate: u32) -> Self {
        Self {
            left: vec![0.0; len],
            right: vec![0.0; len],
            sample_rate,
        }
    }

    pub fn from_channels(
        left: Vec<f32>,
        right: Vec<f32>,
        sample_rate: u32,
    ) -> Result<Self, BufferError> {
        if left.len() != right.len() {
            return Err(BufferError::ChannelLengthMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        Ok(Self {
            left,
            right,
            sample_rate,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.left.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[must_use]
    pub fn left(&self) -> &[f32] {
        &self.left
    }

    #[must_use]
    pub fn right(&self) -> &[f32] {
        &self.right
    }

    pub fn channels_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.left, &mut self.right)
    }

    #[must_use]
    pub fn into_channels(self) -> (Vec<f32>, Vec<f32>) {
        (self.left, self.right)
    }

    /// Appends `extra` silent samples to both channels.
    #[must_use]
    pub fn extended(mut self, extra: usize) -> Self {
        let len = self.left.len().saturating_add(extra);
        self.left.resize(len, 0.0);
        self.right.resize(len, 0.0);
        self
    }

    /// Largest absolute sample across both channels.
    #[must_use]
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(self.right.iter())
            .map(|sample| sample.abs())
            .fold(0.0_f32, f32::max)
    }

    #[must_use]
    pub fn downmix(&self) -> Vec<f32> {
        self.left
            .iter()
            .zip(self.right.iter())
            .map(|(left, right)| (left + right) / 2.0)
            .collect()
    }
}

const fn default_bpm() -> f64 {
    DEFAULT_BPM
}

const fn default_beats_per_bar() -> u32 {
    DEFAULT_BEATS_PER_BAR
}

const fn default_ticks_per_quarter() -> u32 {
    DEFAULT_TICKS_PER_QUARTER
}

const fn default_frequency_hz() -> f64 {
    DEFAULT_FREQUENCY_HZ
}

const fn default_volume() -> f64 {
    1.0
}

const fn default_filter_q() -> f64 {
    DEFAULT_FILTER_Q
}

const fn default_room_size() -> f64 {
    DEFAULT_ROOM_SIZE
}

const fn default_damping() -> f64 {
    DEFAULT_DAMPING
}
