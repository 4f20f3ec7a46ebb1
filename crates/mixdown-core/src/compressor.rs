//! Linked-stereo feed-forward compressor working in the dB domain.

use tracing::{debug, instrument};

use crate::model::{CompressorSpec, StereoBuffer};

const LEVEL_FLOOR: f64 = 1e-10;

#[must_use]
pub fn linear_to_db(linear: f64) -> f64 {
    20.0 * linear.max(LEVEL_FLOOR).log10()
}

#[must_use]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Target gain reduction in dB for a detector level, soft knee included.
#[must_use]
pub fn gain_reduction_db(input_db: f64, spec: &CompressorSpec) -> f64 {
    let slope = 1.0 - 1.0 / spec.ratio;
    let half_knee = spec.knee_db / 2.0;
    let over = input_db - spec.threshold_db;

    if spec.knee_db <= 0.0 {
        return if over > 0.0 { over * slope } else { 0.0 };
    }

    if over < -half_knee {
        0.0
    } else if over > half_knee {
        over * slope
    } else {
        let x = over + half_knee;
        x * x * slope / (2.0 * spec.knee_db)
    }
}

fn ballistics_coefficient(time_seconds: f64, sample_rate: u32) -> f64 {
    (-1.0 / (time_seconds * f64::from(sample_rate))).exp()
}

/// Compresses both channels with one shared gain, returning the buffer.
#[instrument(skip(buffer), fields(samples = buffer.len(), sample_rate = buffer.sample_rate()))]
#[must_use]
pub fn apply_compressor(mut buffer: StereoBuffer, spec: &CompressorSpec) -> StereoBuffer {
    let sample_rate = buffer.sample_rate();
    let attack = ballistics_coefficient(spec.attack.0, sample_rate);
    let release = ballistics_coefficient(spec.release.0, sample_rate);
    let makeup = db_to_linear(spec.makeup_gain_db);

    let mut envelope_db = 0.0_f64;
    let mut max_reduction_db = 0.0_f64;
    let (left, right) = buffer.channels_mut();
    for (left, right) in left.iter_mut().zip(right.iter_mut()) {
        let peak = f64::from(left.abs().max(right.abs()));
        let target = gain_reduction_db(linear_to_db(peak), spec);

        let coefficient = if target > envelope_db { attack } else { release };
        envelope_db = coefficient * envelope_db + (1.0 - coefficient) * target;
        max_reduction_db = max_reduction_db.max(envelope_db);

        let gain = db_to_linear(-envelope_db) * makeup;
        *left = (f64::from(*left) * gain) as f32;
        *right = (f64::from(*right) * gain) as f32;
    }

    debug!(
        threshold_db = spec.threshold_db,
        ratio = spec.ratio,
        max_reduction_db,
        "compressor applied"
    );
    buffer
}
