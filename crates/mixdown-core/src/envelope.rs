//! Exponential ADSR evaluated per sample index.
//!
//! Stage lengths are wall-clock seconds while the event length comes from
//! frames or beats, so the release window is anchored to the end of the
//! event buffer rather than to a note-off.

use crate::model::Envelope;

const CURVE: f64 = 5.0;

/// Envelope shape resolved against one event's sample count.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeShape {
    attack_samples: f64,
    decay_samples: f64,
    sustain: f64,
    release_samples: i64,
    release_start: i64,
    release_level: f64,
}

impl EnvelopeShape {
    #[must_use]
    pub fn new(envelope: &Envelope, sample_rate: u32, total_samples: usize) -> Self {
        let attack_samples = envelope.attack.to_samples(sample_rate).max(0.0);
        let decay_samples = envelope.decay.to_samples(sample_rate).max(0.0);
        let sustain = envelope.sustain.clamp(0.0, 1.0);
        let release_samples = envelope.release.to_samples(sample_rate).max(0.0).round() as i64;
        let total = i64::try_from(total_samples).unwrap_or(i64::MAX);
        let release_start = total - release_samples;

        let mut shape = Self {
            attack_samples,
            decay_samples,
            sustain,
            release_samples,
            release_start,
            release_level: 0.0,
        };
        // A release longer than the event starts before sample 0; the level
        // it fades from is taken at the first real sample.
        shape.release_level = shape.ads_level(release_start.max(0));
        shape
    }

    /// Attack/decay/sustain level at `index`, ignoring release.
    #[must_use]
    pub fn ads_level(&self, index: i64) -> f64 {
        let t = index as f64;
        if t < self.attack_samples {
            1.0 - (-CURVE * t / self.attack_samples).exp()
        } else if t < self.attack_samples + self.decay_samples {
            let into_decay = t - self.attack_samples;
            self.sustain + (1.0 - self.sustain) * (-CURVE * into_decay / self.decay_samples).exp()
        } else {
            self.sustain
        }
    }

    #[must_use]
    pub fn level(&self, index: usize) -> f64 {
        let index = i64::try_from(index).unwrap_or(i64::MAX);
        if self.release_samples > 0 && index >= self.release_start {
            let progress = (index - self.release_start) as f64 / self.release_samples as f64;
            self.release_level * (-CURVE * progress).exp()
        } else {
            self.ads_level(index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Seconds;

    fn envelope(attack: f64, decay: f64, sustain: f64, release: f64) -> Envelope {
        Envelope {
            attack: Seconds(attack),
            decay: Seconds(decay),
            sustain,
            release: Seconds(release),
        }
    }

    #[test]
    fn default_envelope_is_flat_at_sustain() {
        let shape = EnvelopeShape::new(&Envelope::default(), 44_100, 1_000);
        assert_eq!(shape.level(0), 1.0);
        assert_eq!(shape.level(999), 1.0);
    }

    #[test]
    fn attack_starts_at_zero() {
        let shape = EnvelopeShape::new(&envelope(0.01, 0.0, 1.0, 0.0), 44_100, 4_410);
        assert!(shape.level(0).abs() < 1e-12);
        assert!(shape.level(220) > 0.9);
    }

    #[test]
    fn sustain_begins_after_attack_and_decay() {
        // 100 attack samples + 200 decay samples at 10 kHz.
        let shape = EnvelopeShape::new(&envelope(0.01, 0.02, 0.3, 0.0), 10_000, 1_000);
        assert!((shape.level(300) - 0.3).abs() < 1e-12);
        assert!(shape.level(150) > 0.3);
        assert!((shape.level(600) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn release_ends_on_last_sample() {
        let total = 1_000;
        let shape = EnvelopeShape::new(&envelope(0.0, 0.0, 0.8, 0.01), 10_000, total);
        // Release covers the final 100 samples.
        assert!((shape.level(899) - 0.8).abs() < 1e-12);
        assert!((shape.level(900) - 0.8).abs() < 1e-12);
        let last = shape.level(total - 1);
        assert!(last < 0.8 * (-4.9_f64).exp() + 1e-9);
        assert!(last >= 0.0);
    }

    #[test]
    fn release_longer_than_event_is_never_negative() {
        let total = 500;
        let shape = EnvelopeShape::new(&envelope(0.02, 0.0, 1.0, 1.0), 10_000, total);
        for index in 0..total {
            let level = shape.level(index);
            assert!(level >= 0.0, "level {level} at {index} dipped below zero");
            assert!(level <= 1.0);
        }
    }
}
