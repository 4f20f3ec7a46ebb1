use tracing::{trace, warn};

use crate::{
    envelope::EnvelopeShape,
    filter::{BiquadCoeffs, process_block},
    model::{Event, Length},
    osc::{NoiseSource, oscillate},
    time::{beats_to_seconds, round_half_up},
};

/// Resolved length of an event in seconds.
///
/// A beat length without a tempo falls back to the frame duration it
/// shadowed, and resolves to `None` when there is none.
#[must_use]
pub fn event_seconds(event: &Event, fps: u32, bpm: Option<f64>) -> Option<f64> {
    let frames_to_seconds = |frames: f64| frames / f64::from(fps);
    match (event.length, bpm) {
        (Length::Beats { beats, .. }, Some(bpm)) => Some(beats_to_seconds(beats, bpm)),
        (
            Length::Beats {
                fallback_frames, ..
            },
            None,
        ) => fallback_frames.map(frames_to_seconds),
        (Length::Frames(frames), _) => Some(frames_to_seconds(frames)),
    }
}

#[must_use]
pub fn event_sample_count(event: &Event, sample_rate: u32, fps: u32, bpm: Option<f64>) -> usize {
    event_seconds(event, fps, bpm).map_or(0, |seconds| {
        usize::try_from(round_half_up(seconds * f64::from(sample_rate))).unwrap_or(0)
    })
}

/// Soft clip with drive `amount * 50`, normalized so full scale maps to 1.
#[must_use]
pub fn soft_clip(sample: f64, amount: f64) -> f64 {
    let drive = amount * 50.0;
    (drive * sample).tanh() / drive.tanh()
}

/// Renders one event into a mono buffer using the event's own noise seed.
#[must_use]
pub fn render_event(event: &Event, sample_rate: u32, fps: u32, bpm: Option<f64>) -> Vec<f32> {
    let mut noise = NoiseSource::for_position(event.position);
    render_event_with_noise(event, sample_rate, fps, bpm, &mut noise)
}

/// Renders one event, drawing noise samples from `noise`.
///
/// Processing order per sample is oscillator, envelope, volume, distortion;
/// the optional filter then runs over the whole buffer.
pub fn render_event_with_noise(
    event: &Event,
    sample_rate: u32,
    fps: u32,
    bpm: Option<f64>,
    noise: &mut NoiseSource,
) -> Vec<f32> {
    if bpm.is_none()
        && matches!(
            event.length,
            Length::Beats {
                fallback_frames: None,
                ..
            }
        )
    {
        warn!("beat-length event rendered without a tempo; producing silence");
    }

    let total = event_sample_count(event, sample_rate, fps, bpm);
    if total == 0 {
        return Vec::new();
    }

    let envelope = EnvelopeShape::new(&event.envelope, sample_rate, total);
    let start_hz = event.frequency_hz;
    let end_hz = event.slide_to_hz.unwrap_or(start_hz);
    let rate = f64::from(sample_rate);

    let mut samples = Vec::with_capacity(total);
    let mut phase = 0.0_f64;
    for index in 0..total {
        let t = index as f64 / total as f64;
        let frequency = start_hz + (end_hz - start_hz) * t;
        let dt = frequency / rate;

        let mut value = oscillate(event.waveform, phase, dt, noise);
        value *= envelope.level(index);
        value *= event.volume;
        if event.distortion > 0.0 {
            value = soft_clip(value, event.distortion);
        }
        samples.push(value as f32);

        phase += dt;
        phase -= phase.floor();
    }

    if let Some(filter) = event.filter {
        let coeffs = BiquadCoeffs::new(filter.kind, filter.cutoff_hz, filter.q, sample_rate);
        process_block(&mut samples, &coeffs);
    }

    trace!(samples = samples.len(), waveform = ?event.waveform, "event rendered");
    samples
}
