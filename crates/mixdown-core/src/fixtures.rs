use crate::model::{
    CompressorSpec, Envelope, Event, FilterKind, FilterSpec, ReverbSpec, Seconds, Track, Waveform,
};

/// Frames covered by [`demo_track`] at 30 fps.
pub const DEMO_TOTAL_FRAMES: u32 = 240;

/// Two bars of a short sting exercising every synthesis feature.
#[must_use]
pub fn demo_track() -> Track {
    let mut track = Track::new(120.0);

    let pluck = Envelope {
        attack: Seconds(0.005),
        decay: Seconds(0.12),
        sustain: 0.35,
        release: Seconds(0.08),
    };
    let pad = Envelope {
        attack: Seconds(0.4),
        decay: Seconds(0.3),
        sustain: 0.7,
        release: Seconds(0.6),
    };
    let hit = Envelope {
        attack: Seconds::ZERO,
        decay: Seconds(0.05),
        sustain: 0.0,
        release: Seconds::ZERO,
    };

    let lead_notes = [(0, 523.25), (1, 659.25), (2, 783.99), (3, 1_046.5)];
    for (beat, frequency) in lead_notes {
        track.events.push(
            Event::at_bbt(0, beat, 0, 0.75)
                .with_waveform(Waveform::Square)
                .with_frequency(frequency)
                .with_envelope(pluck)
                .with_volume(0.35)
                .with_filter(FilterSpec::new(FilterKind::Lowpass, 3_200.0))
                .with_pan(-0.35),
        );
    }

    track.events.push(
        Event::at_bbt(0, 0, 0, 8.0)
            .with_waveform(Waveform::Saw)
            .with_frequency(130.81)
            .with_envelope(pad)
            .with_volume(0.25)
            .with_filter(FilterSpec {
                kind: FilterKind::Bandpass,
                cutoff_hz: 900.0,
                q: 1.4,
            })
            .with_pan(0.3),
    );

    track.events.push(
        Event::at_frame(60, 30)
            .with_waveform(Waveform::Triangle)
            .with_frequency(110.0)
            .with_slide_to(55.0)
            .with_envelope(pluck)
            .with_volume(0.6)
            .with_distortion(0.2),
    );

    for bar_beat in 0..8_u32 {
        track.events.push(
            Event::at_bbt(bar_beat / 4, bar_beat % 4, 240, 0.25)
                .with_waveform(Waveform::Noise)
                .with_envelope(hit)
                .with_volume(0.3)
                .with_filter(FilterSpec::new(FilterKind::Highpass, 6_000.0))
                .with_pan(if bar_beat % 2 == 0 { 0.6 } else { -0.6 }),
        );
    }

    track.events.push(
        Event::at_frame(120, 45)
            .with_frequency(880.0)
            .with_envelope(pad)
            .with_volume(0.3)
            .with_pan(1.0),
    );

    track.reverb = Some(ReverbSpec {
        wet: 0.25,
        room_size: 0.6,
        damping: 0.4,
    });
    track.compressor = Some(CompressorSpec {
        threshold_db: -14.0,
        ratio: 3.0,
        knee_db: 6.0,
        attack: Seconds(0.005),
        release: Seconds(0.2),
        makeup_gain_db: 2.0,
    });
    track
}
