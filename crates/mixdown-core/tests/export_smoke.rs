use mixdown_core::{
    ChannelLayout, Engine, RenderSettings,
    export::{inspect_wav, write_mono_wav},
    fixtures::{DEMO_TOTAL_FRAMES, demo_track},
    model::{Event, Track},
    persistence::{load_track, save_track},
};

#[test]
fn stereo_export_produces_readable_wav() {
    let temp = tempfile::tempdir().expect("tempdir should work");
    let output = temp.path().join("renders").join("demo.wav");
    let engine = Engine::new(RenderSettings::default());
    let track = demo_track();

    engine
        .export(&track, DEMO_TOTAL_FRAMES, ChannelLayout::Stereo, &output)
        .expect("export should succeed");

    let info = inspect_wav(&output).expect("wav should be readable");
    assert_eq!(info.channels, 2);
    assert_eq!(info.sample_rate, 44_100);
    assert_eq!(info.bits_per_sample, 16);
    // Eight seconds of video plus the one second reverb tail.
    assert_eq!(info.frames, 9 * 44_100);

    let metadata = std::fs::metadata(&output).expect("metadata should exist");
    assert_eq!(metadata.len(), 44 + 9 * 44_100 * 4);
}

#[test]
fn mono_export_at_custom_rate() {
    let temp = tempfile::tempdir().expect("tempdir should work");
    let output = temp.path().join("mono.wav");
    let engine = Engine::new(RenderSettings {
        sample_rate: 22_050,
        fps: 24,
    });
    let mut track = Track::new(90.0);
    track.events.push(Event::at_frame(0, 24).with_volume(0.5));

    engine
        .export(&track, 48, ChannelLayout::Mono, &output)
        .expect("export should succeed");

    let info = inspect_wav(&output).expect("wav should be readable");
    assert_eq!(info.channels, 1);
    assert_eq!(info.sample_rate, 22_050);
    assert_eq!(info.frames, 44_100);
    assert!((info.duration_seconds - 2.0).abs() < 1e-9);
}

#[test]
fn empty_render_still_writes_header() {
    let temp = tempfile::tempdir().expect("tempdir should work");
    let output = temp.path().join("empty.wav");
    write_mono_wav(&output, &[], 44_100).expect("write should succeed");

    let info = inspect_wav(&output).expect("wav should be readable");
    assert_eq!(info.frames, 0);
    assert_eq!(std::fs::metadata(&output).expect("metadata").len(), 44);
}

#[test]
fn saved_track_renders_identically_after_reload() {
    let temp = tempfile::tempdir().expect("tempdir should work");
    let track_path = temp.path().join("demo.track.json");
    let track = demo_track();
    save_track(&track_path, &track).expect("save should succeed");
    let loaded = load_track(&track_path).expect("load should succeed");
    assert_eq!(loaded, track);

    let engine = Engine::default();
    let original = engine
        .render_wav(&track, 60, ChannelLayout::Stereo)
        .expect("render should succeed");
    let reloaded = engine
        .render_wav(&loaded, 60, ChannelLayout::Stereo)
        .expect("render should succeed");
    assert_eq!(original, reloaded);
}

#[test]
fn invalid_track_is_not_exported() {
    let temp = tempfile::tempdir().expect("tempdir should work");
    let output = temp.path().join("never.wav");
    let engine = Engine::default();

    let result = engine.export(&Track::new(-10.0), 30, ChannelLayout::Stereo, &output);
    assert!(result.is_err());
    assert!(!output.exists());
}
