//! Band-limited oscillators and the seeded noise source.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::model::{Position, Waveform};

/// PolyBLEP correction for a unit step at phase 0.
///
/// `phase` is normalized to `[0, 1)`, `dt` is the per-sample phase increment.
#[must_use]
pub fn poly_blep(phase: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        return 0.0;
    }
    if phase < dt {
        let n = phase / dt;
        n + n - n * n - 1.0
    } else if phase > 1.0 - dt {
        let n = (phase - 1.0) / dt;
        n * n + n + n + 1.0
    } else {
        0.0
    }
}

#[must_use]
pub fn sine(phase: f64) -> f64 {
    (2.0 * PI * phase).sin()
}

#[must_use]
pub fn square(phase: f64, dt: f64) -> f64 {
    let mut value = if phase < 0.5 { 1.0 } else { -1.0 };
    value += poly_blep(phase, dt);
    value -= poly_blep((phase + 0.5) % 1.0, dt);
    value
}

#[must_use]
pub fn saw(phase: f64, dt: f64) -> f64 {
    2.0 * phase - 1.0 - poly_blep(phase, dt)
}

#[must_use]
pub fn triangle(phase: f64) -> f64 {
    if phase < 0.5 {
        4.0 * phase - 1.0
    } else {
        3.0 - 4.0 * phase
    }
}

/// Deterministic white noise in `[-1, 1)`.
///
/// Every event gets its own instance, seeded from its position, so renders
/// never share generator state.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: Pcg32,
}

impl NoiseSource {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn for_position(position: Position) -> Self {
        Self::new(position_seed(position))
    }

    pub fn next_sample(&mut self) -> f64 {
        self.rng.random::<f64>() * 2.0 - 1.0
    }
}

/// Seed derived from where an event sits on the timeline.
#[must_use]
pub fn position_seed(position: Position) -> u64 {
    match position {
        Position::Bbt(bbt) => {
            (u64::from(bbt.bar) << 40) ^ (u64::from(bbt.beat) << 20) ^ u64::from(bbt.tick)
        }
        // High bit keeps frame seeds apart from bar/beat/tick seeds.
        Position::Frame(frame) => frame.to_bits() ^ (1 << 63),
    }
}

/// One oscillator sample at `phase`. Noise ignores phase and pulls from `noise`.
pub fn oscillate(waveform: Waveform, phase: f64, dt: f64, noise: &mut NoiseSource) -> f64 {
    match waveform {
        Waveform::Sine => sine(phase),
        Waveform::Square => square(phase, dt),
        Waveform::Saw => saw(phase, dt),
        Waveform::Triangle => triangle(phase),
        Waveform::Noise => noise.next_sample(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::BarBeatTick;

    #[test]
    fn blep_is_zero_away_from_edges() {
        assert_eq!(poly_blep(0.5, 0.01), 0.0);
        assert_eq!(poly_blep(0.25, 0.01), 0.0);
    }

    #[test]
    fn blep_matches_polynomials_at_edges() {
        let dt = 0.1;
        // n = 0.5 after the rising edge: 0.5 + 0.5 - 0.25 - 1
        assert!((poly_blep(0.05, dt) - (-0.25)).abs() < 1e-12);
        // n = -0.5 before the wrap: 0.25 - 0.5 - 0.5 + 1
        assert!((poly_blep(0.95, dt) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn naive_shapes_hold_between_edges() {
        let dt = 0.001;
        assert_eq!(square(0.25, dt), 1.0);
        assert_eq!(square(0.75, dt), -1.0);
        assert!((saw(0.25, dt) - (-0.5)).abs() < 1e-12);
        assert_eq!(triangle(0.0), -1.0);
        assert_eq!(triangle(0.5), 1.0);
        assert!(sine(0.0).abs() < 1e-12);
        assert!((sine(0.25) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn band_limited_shapes_stay_bounded() {
        let dt = 440.0 / 44_100.0;
        let mut phase = 0.0;
        for _ in 0..44_100 {
            assert!(square(phase, dt).abs() <= 1.5);
            assert!(saw(phase, dt).abs() <= 1.5);
            phase = (phase + dt) % 1.0;
        }
    }

    #[test]
    fn noise_is_reproducible_per_seed() {
        let position = Position::Bbt(BarBeatTick {
            bar: 2,
            beat: 1,
            tick: 0,
        });
        let mut first = NoiseSource::for_position(position);
        let mut second = NoiseSource::for_position(position);
        for _ in 0..256 {
            let sample = first.next_sample();
            assert_eq!(sample, second.next_sample());
            assert!((-1.0..1.0).contains(&sample));
        }
    }

    #[test]
    fn different_positions_seed_differently() {
        assert_ne!(
            position_seed(Position::Frame(0.0)),
            position_seed(Position::Bbt(BarBeatTick::default()))
        );
        assert_ne!(
            position_seed(Position::Frame(1.0)),
            position_seed(Position::Frame(2.0))
        );
    }
}
