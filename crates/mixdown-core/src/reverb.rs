//! Schroeder reverb: four damped combs in parallel, two allpasses in series,
//! one network per channel.

use tracing::{debug, instrument};

use crate::{
    model::{ReverbSpec, StereoBuffer},
    time::round_half_up,
};

const REFERENCE_RATE: f64 = 44_100.0;
const COMB_TUNING: [usize; 4] = [1557, 1617, 1491, 1422];
const ALLPASS_TUNING: [usize; 2] = [225, 556];
const STEREO_SPREAD: usize = 23;
const ALLPASS_FEEDBACK: f64 = 0.5;
const ROOM_OFFSET: f64 = 0.7;
const ROOM_SCALE: f64 = 0.28;

/// Tail appended before processing so the decay is not cut off.
pub const TAIL_SECONDS: f64 = 1.0;

#[derive(Debug, Clone)]
struct CombFilter {
    buffer: Vec<f64>,
    index: usize,
    feedback: f64,
    damping: f64,
    filter_store: f64,
}

impl CombFilter {
    fn new(size: usize, feedback: f64, damping: f64) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
            feedback,
            damping,
            filter_store: 0.0,
        }
    }

    fn process(&mut self, input: f64) -> f64 {
        let output = self.buffer[self.index];
        self.filter_store = output * (1.0 - self.damping) + self.filter_store * self.damping;
        self.buffer[self.index] = input + self.filter_store * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }
}

#[derive(Debug, Clone)]
struct AllpassFilter {
    buffer: Vec<f64>,
    index: usize,
}

impl AllpassFilter {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
        }
    }

    fn process(&mut self, input: f64) -> f64 {
        let buffered = self.buffer[self.index];
        let output = -input + buffered;
        self.buffer[self.index] = input + buffered * ALLPASS_FEEDBACK;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }
}

/// One channel's comb bank and allpass chain.
#[derive(Debug, Clone)]
struct ReverbChannel {
    combs: Vec<CombFilter>,
    allpasses: Vec<AllpassFilter>,
}

impl ReverbChannel {
    fn new(spec: &ReverbSpec, sample_rate: u32, spread: usize) -> Self {
        let feedback = ROOM_OFFSET + spec.room_size * ROOM_SCALE;
        let combs = COMB_TUNING
            .iter()
            .map(|&length| {
                CombFilter::new(
                    scaled_length(length + spread, sample_rate),
                    feedback,
                    spec.damping,
                )
            })
            .collect();
        let allpasses = ALLPASS_TUNING
            .iter()
            .map(|&length| AllpassFilter::new(scaled_length(length, sample_rate)))
            .collect();

        Self { combs, allpasses }
    }

    fn process(&mut self, input: f64) -> f64 {
        let summed: f64 = self.combs.iter_mut().map(|comb| comb.process(input)).sum();
        self.allpasses
            .iter_mut()
            .fold(summed * 0.25, |signal, allpass| allpass.process(signal))
    }

    fn run(&mut self, samples: &mut [f32], wet: f64) {
        let dry = 1.0 - wet;
        for sample in samples.iter_mut() {
            let input = f64::from(*sample);
            let reverberated = self.process(input);
            *sample = (dry * input + wet * reverberated) as f32;
        }
    }
}

fn scaled_length(reference: usize, sample_rate: u32) -> usize {
    let scaled = reference as f64 * f64::from(sample_rate) / REFERENCE_RATE;
    usize::try_from(round_half_up(scaled)).unwrap_or(1).max(1)
}

#[must_use]
pub fn tail_samples(sample_rate: u32) -> usize {
    usize::try_from(round_half_up(TAIL_SECONDS * f64::from(sample_rate))).unwrap_or(0)
}

/// Applies the reverb, returning a buffer extended by the decay tail.
#[instrument(skip(buffer), fields(samples = buffer.len(), sample_rate = buffer.sample_rate()))]
#[must_use]
pub fn apply_reverb(buffer: StereoBuffer, spec: &ReverbSpec) -> StereoBuffer {
    let sample_rate = buffer.sample_rate();
    let mut buffer = buffer.extended(tail_samples(sample_rate));

    let mut left = ReverbChannel::new(spec, sample_rate, 0);
    let mut right = ReverbChannel::new(spec, sample_rate, STEREO_SPREAD);
    let (left_samples, right_samples) = buffer.channels_mut();
    left.run(left_samples, spec.wet);
    right.run(right_samples, spec.wet);

    debug!(
        samples = buffer.len(),
        wet = spec.wet,
        room_size = spec.room_size,
        "reverb applied"
    );
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse(len: usize, sample_rate: u32) -> StereoBuffer {
        let mut buffer = StereoBuffer::silent(len, sample_rate);
        let (left, right) = buffer.channels_mut();
        left[0] = 1.0;
        right[0] = 1.0;
        buffer
    }

    #[test]
    fn delay_lengths_scale_with_sample_rate() {
        assert_eq!(scaled_length(1557, 44_100), 1557);
        assert_eq!(scaled_length(1557, 88_200), 3114);
        assert_eq!(scaled_length(225, 48_000), 245);
    }

    #[test]
    fn dry_mix_passes_signal_and_pads_tail() {
        let buffer = impulse(100, 44_100);
        let out = apply_reverb(buffer, &ReverbSpec::new(0.0));
        assert_eq!(out.len(), 100 + 44_100);
        assert_eq!(out.left()[0], 1.0);
        assert!(out.left()[1..].iter().all(|sample| *sample == 0.0));
    }

    #[test]
    fn impulse_rings_past_original_length() {
        let buffer = impulse(1_000, 44_100);
        let out = apply_reverb(buffer, &ReverbSpec::new(1.0));
        assert_eq!(out.len(), 1_000 + 44_100);
        assert_eq!(out.left().len(), out.right().len());

        let late_energy: f32 = out.left()[5_000..20_000]
            .iter()
            .map(|sample| sample.abs())
            .sum();
        assert!(late_energy > 0.01, "late energy {late_energy}");
    }

    #[test]
    fn channels_decorrelate_through_spread() {
        let out = apply_reverb(impulse(10, 44_100), &ReverbSpec::new(1.0));
        assert_ne!(out.left(), out.right());
    }
}
