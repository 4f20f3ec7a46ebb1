//! RBJ cookbook biquads run in Direct Form II Transposed.

use std::f64::consts::PI;

use crate::model::FilterKind;

/// Normalized biquad coefficients (`a0 == 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// `q` must be positive; it is not checked.
    #[must_use]
    pub fn new(kind: FilterKind, cutoff_hz: f64, q: f64, sample_rate: u32) -> Self {
        let omega = 2.0 * PI * cutoff_hz / f64::from(sample_rate);
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let (b0, b1, b2) = match kind {
            FilterKind::Lowpass => (
                (1.0 - cos_omega) / 2.0,
                1.0 - cos_omega,
                (1.0 - cos_omega) / 2.0,
            ),
            FilterKind::Highpass => (
                (1.0 + cos_omega) / 2.0,
                -(1.0 + cos_omega),
                (1.0 + cos_omega) / 2.0,
            ),
            // Constant 0 dB peak gain.
            FilterKind::Bandpass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Filter memory. Reuse one across calls to stream a signal in blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadState {
    pub z1: f64,
    pub z2: f64,
}

impl BiquadState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub fn process(samples: &mut [f32], coeffs: &BiquadCoeffs, state: &mut BiquadState) {
    for sample in samples.iter_mut() {
        let x = f64::from(*sample);
        let y = coeffs.b0 * x + state.z1;
        state.z1 = coeffs.b1 * x - coeffs.a1 * y + state.z2;
        state.z2 = coeffs.b2 * x - coeffs.a2 * y;
        *sample = y as f32;
    }
}

/// Filters a whole buffer from zeroed state.
pub fn process_block(samples: &mut [f32], coeffs: &BiquadCoeffs) {
    let mut state = BiquadState::default();
    process(samples, coeffs, &mut state);
}
