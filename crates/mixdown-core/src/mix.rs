//! Event placement, equal-power panning and master-bus processing.

use std::f64::consts::FRAC_PI_4;

use tracing::{debug, info, instrument, warn};

use crate::{
    compressor::apply_compressor,
    model::{Event, Position, StereoBuffer, Track},
    render::render_event,
    reverb::apply_reverb,
    time::{bbt_to_samples, frames_to_samples, round_half_up},
};

const NORMALIZE_TARGET: f32 = 0.95;

/// Equal-power `(left, right)` gains for a pan in `[-1, 1]`.
#[must_use]
pub fn pan_gains(pan: f64) -> (f64, f64) {
    let theta = FRAC_PI_4 * (pan + 1.0);
    (theta.cos(), theta.sin())
}

/// Output length for a video of `total_frames` at `fps`.
#[must_use]
pub fn buffer_length(total_frames: u32, fps: u32, sample_rate: u32) -> usize {
    let seconds = f64::from(total_frames) / f64::from(fps);
    usize::try_from(round_half_up(seconds * f64::from(sample_rate))).unwrap_or(0)
}

#[must_use]
pub fn event_start_sample(event: &Event, track: &Track, fps: u32, sample_rate: u32) -> i64 {
    match event.position {
        Position::Bbt(position) => bbt_to_samples(position, &track.tempo(), sample_rate),
        Position::Frame(frame) => frames_to_samples(frame, fps, sample_rate),
    }
}

/// Adds `mono * gain` into `destination` starting at `start`, dropping any
/// samples that fall outside it.
pub fn accumulate(destination: &mut [f32], mono: &[f32], start: i64, gain: f64) -> usize {
    let mut written = 0;
    for (offset, sample) in mono.iter().enumerate() {
        let Ok(offset) = i64::try_from(offset) else {
            break;
        };
        let Ok(index) = usize::try_from(start + offset) else {
            continue;
        };
        let Some(slot) = destination.get_mut(index) else {
            break;
        };
        *slot += (f64::from(*sample) * gain) as f32;
        written += 1;
    }
    written
}

/// Sums every event into a fresh buffer without master processing.
#[instrument(skip(track), fields(events = track.events.len()))]
#[must_use]
pub fn mix_events(track: &Track, total_frames: u32, fps: u32, sample_rate: u32) -> StereoBuffer {
    let mut buffer = StereoBuffer::silent(buffer_length(total_frames, fps, sample_rate), sample_rate);

    for (event_index, event) in track.events.iter().enumerate() {
        let start = event_start_sample(event, track, fps, sample_rate);
        let mono = render_event(event, sample_rate, fps, Some(track.bpm));
        let (gain_left, gain_right) = pan_gains(event.pan);

        let (left, right) = buffer.channels_mut();
        let written = accumulate(left, &mono, start, gain_left);
        accumulate(right, &mono, start, gain_right);

        if written == 0 && !mono.is_empty() {
            warn!(event_index, start, "event falls entirely outside the mix buffer");
        } else {
            debug!(event_index, start, samples = mono.len(), written, "event mixed");
        }
    }

    buffer
}

/// Scales the buffer to a 0.95 peak when it exceeds full scale.
#[must_use]
pub fn normalize_peak(mut buffer: StereoBuffer) -> StereoBuffer {
    let peak = buffer.peak();
    if peak > 1.0 {
        let scale = NORMALIZE_TARGET / peak;
        let (left, right) = buffer.channels_mut();
        for sample in left.iter_mut().chain(right.iter_mut()) {
            *sample *= scale;
        }
        debug!(peak, scale, "buffer normalized");
    }
    buffer
}

/// Runs reverb (if any), then the compressor or, without one, the fallback
/// normalizer.
#[must_use]
pub fn master(buffer: StereoBuffer, track: &Track) -> StereoBuffer {
    let buffer = match &track.reverb {
        Some(reverb) => apply_reverb(buffer, reverb),
        None => buffer,
    };
    match &track.compressor {
        Some(compressor) => apply_compressor(buffer, compressor),
        None => normalize_peak(buffer),
    }
}

/// Renders a track to a mastered stereo buffer.
///
/// With reverb enabled the result is longer than the video by the reverb
/// tail; downstream muxing trims it.
#[instrument(skip(track), fields(events = track.events.len()))]
#[must_use]
pub fn mix_track(track: &Track, total_frames: u32, fps: u32, sample_rate: u32) -> StereoBuffer {
    let mixed = mix_events(track, total_frames, fps, sample_rate);
    let mastered = master(mixed, track);
    info!(samples = mastered.len(), "track mixed");
    mastered
}

/// Mono rendering path: mastered stereo mix folded to `(L + R) / 2`, then
/// peak-limited on its own.
#[instrument(skip(track), fields(events = track.events.len()))]
#[must_use]
pub fn mix_track_mono(track: &Track, total_frames: u32, fps: u32, sample_rate: u32) -> Vec<f32> {
    let stereo = mix_track(track, total_frames, fps, sample_rate);
    let mut mono = stereo.downmix();

    let peak = mono.iter().map(|sample| sample.abs()).fold(0.0_f32, f32::max);
    if peak > 1.0 {
        let scale = NORMALIZE_TARGET / peak;
        for sample in &mut mono {
            *sample *= scale;
        }
    }
    mono
}
