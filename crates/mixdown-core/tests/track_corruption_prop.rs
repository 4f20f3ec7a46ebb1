use mixdown_core::persistence::load_track;
use proptest::prelude::*;

const VALID_TRACK: &str = r#"{
  "bpm": 128.0,
  "events": [
    { "frame": 0, "duration_frames": 30, "waveform": "square", "frequency_hz": 220.0 },
    { "bar": 1, "beat": 2, "tick": 120, "duration_beats": 0.5, "pan": -0.4,
      "filter": { "kind": "lowpass", "cutoff_hz": 1200.0, "q": 0.9 } }
  ],
  "reverb": { "wet": 0.2 }
}"#;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..2048)) {
        let temp = tempfile::tempdir().expect("tempdir should work");
        let path = temp.path().join("random.track.json");
        std::fs::write(&path, bytes).expect("write should work");
        let _ = load_track(&path);
    }

    #[test]
    fn truncated_track_never_panics(cut in 0_usize..VALID_TRACK.len()) {
        let temp = tempfile::tempdir().expect("tempdir should work");
        let path = temp.path().join("truncated.track.json");
        std::fs::write(&path, &VALID_TRACK.as_bytes()[..cut]).expect("write should work");
        prop_assert!(load_track(&path).is_err());
    }

    #[test]
    fn byte_flips_never_panic(
        index in 0_usize..VALID_TRACK.len(),
        replacement in any::<u8>(),
    ) {
        let temp = tempfile::tempdir().expect("tempdir should work");
        let path = temp.path().join("flipped.track.json");
        let mut bytes = VALID_TRACK.as_bytes().to_vec();
        bytes[index] = replacement;
        std::fs::write(&path, bytes).expect("write should work");
        let _ = load_track(&path);
    }
}

#[test]
fn valid_fixture_loads() {
    let temp = tempfile::tempdir().expect("tempdir should work");
    let path = temp.path().join("valid.track.json");
    std::fs::write(&path, VALID_TRACK).expect("write should work");
    let track = load_track(&path).expect("fixture should parse");
    assert_eq!(track.events.len(), 2);
    assert!(track.compressor.is_none());
}
