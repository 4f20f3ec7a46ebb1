use serde::{Deserialize, Serialize};

/// Tempo-relative position: 0-indexed bar and beat plus a sub-beat tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarBeatTick {
    pub bar: u32,
    pub beat: u32,
    #[serde(default)]
    pub tick: u32,
}

/// Tempo grid used to resolve [`BarBeatTick`] positions.
///
/// Callers must ensure `bpm > 0` and non-zero divisions; the conversions
/// below do not check and yield non-finite values otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    pub bpm: f64,
    pub beats_per_bar: u32,
    pub ticks_per_quarter: u32,
}

/// JavaScript-style `Math.round`: halves go towards positive infinity.
#[must_use]
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[must_use]
pub fn beats_to_seconds(beats: f64, bpm: f64) -> f64 {
    beats * (60.0 / bpm)
}

#[must_use]
pub fn bbt_to_beats(position: BarBeatTick, tempo: &Tempo) -> f64 {
    f64::from(position.bar) * f64::from(tempo.beats_per_bar)
        + f64::from(position.beat)
        + f64::from(position.tick) / f64::from(tempo.ticks_per_quarter)
}

#[must_use]
pub fn bbt_to_seconds(position: BarBeatTick, tempo: &Tempo) -> f64 {
    beats_to_seconds(bbt_to_beats(position, tempo), tempo.bpm)
}

#[must_use]
pub fn bbt_to_samples(position: BarBeatTick, tempo: &Tempo, sample_rate: u32) -> i64 {
    round_half_up(bbt_to_seconds(position, tempo) * f64::from(sample_rate))
}

#[must_use]
pub fn bbt_to_frames(position: BarBeatTick, tempo: &Tempo, fps: u32) -> i64 {
    round_half_up(bbt_to_seconds(position, tempo) * f64::from(fps))
}

#[must_use]
pub fn frames_to_samples(frame: f64, fps: u32, sample_rate: u32) -> i64 {
    round_half_up(frame / f64::from(fps) * f64::from(sample_rate))
}

/// Inverse of [`bbt_to_seconds`] for tooling. Bar and beat are floored and
/// the tick remainder is rounded.
#[must_use]
pub fn seconds_to_bbt(seconds: f64, tempo: &Tempo) -> BarBeatTick {
    let total_beats = seconds * (tempo.bpm / 60.0);
    let beats_per_bar = f64::from(tempo.beats_per_bar);
    let bar = (total_beats / beats_per_bar).floor();
    let beat = (total_beats - bar * beats_per_bar).floor();
    let tick = round_half_up(total_beats.fract() * f64::from(tempo.ticks_per_quarter));

    BarBeatTick {
        bar: bar as u32,
        beat: beat as u32,
        tick: tick as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tempo(bpm: f64) -> Tempo {
        Tempo {
            bpm,
            beats_per_bar: 4,
            ticks_per_quarter: 480,
        }
    }

    #[test]
    fn bar_one_at_120_bpm_is_two_seconds() {
        let position = BarBeatTick {
            bar: 1,
            beat: 0,
            tick: 0,
        };
        assert_eq!(bbt_to_seconds(position, &tempo(120.0)), 2.0);
        assert_eq!(bbt_to_samples(position, &tempo(120.0), 44_100), 88_200);
        assert_eq!(bbt_to_frames(position, &tempo(120.0), 30), 60);
    }

    #[test]
    fn ticks_address_sub_beats() {
        let position = BarBeatTick {
            bar: 0,
            beat: 1,
            tick: 240,
        };
        assert_eq!(bbt_to_beats(position, &tempo(120.0)), 1.5);
        assert_eq!(bbt_to_samples(position, &tempo(120.0), 48_000), 36_000);
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(2.49), 2);
    }

    #[test]
    fn seconds_round_trip_through_bbt() {
        let tempo = tempo(128.0);
        let position = BarBeatTick {
            bar: 3,
            beat: 2,
            tick: 120,
        };
        let seconds = bbt_to_seconds(position, &tempo);
        assert_eq!(seconds_to_bbt(seconds, &tempo), position);
    }

    #[test]
    fn frame_positions_convert_to_samples() {
        assert_eq!(frames_to_samples(30.0, 30, 44_100), 44_100);
        assert_eq!(frames_to_samples(1.0, 30, 44_100), 1_470);
        assert_eq!(frames_to_samples(-1.0, 30, 44_100), -1_470);
        assert_eq!(frames_to_samples(0.5, 30, 44_100), 735);
    }
}
