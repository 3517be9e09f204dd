//! Fuzzing tests for the MIDI loader and timeline builder
//!
//! Random and malformed input must either be rejected with an error or
//! produce a well-formed timeline; it must never panic.

mod common;

use common::{arpeggio_track, smf};
use midi_timeline::{AnalysisConfig, MusicTimeline, PlaybackSession};
use rand::Rng;

/// Structural checks every successfully built timeline must pass
fn assert_well_formed(timeline: &MusicTimeline) {
    assert!(timeline.duration().is_finite() && timeline.duration() >= 0.0);
    assert!(!timeline.tempo_events().is_empty());
    assert!(!timeline.time_signature_events().is_empty());
    assert!(timeline.chords().windows(2).all(|w| w[0].time <= w[1].time));
    assert!(timeline.notes().windows(2).all(|w| w[0].time <= w[1].time));
    assert!(timeline.drums().windows(2).all(|w| w[0].time <= w[1].time));
    for chord in timeline.chords() {
        assert!((0.0..=1.0).contains(&chord.tension));
        assert!(chord.root < 12 && chord.degree <= 7);
    }
}

/// Fuzz the loader with random byte sequences
#[test]
fn fuzz_random_bytes() {
    let mut rng = rand::thread_rng();
    let config = AnalysisConfig::default();

    for _ in 0..1000 {
        let length = rng.gen_range(0..=256);
        let random_bytes: Vec<u8> = (0..length).map(|_| rng.gen_range(0..=255)).collect();

        if let Ok(timeline) = MusicTimeline::from_midi_bytes("fuzz", &random_bytes, &config) {
            assert_well_formed(&timeline);
        }
    }
}

/// Valid header followed by a random track body
#[test]
fn fuzz_random_track_bodies() {
    let mut rng = rand::thread_rng();
    let config = AnalysisConfig::default();

    for _ in 0..500 {
        let body_length = rng.gen_range(0..=128);
        let mut body: Vec<u8> = Vec::with_capacity(body_length + 4);
        for _ in 0..body_length {
            // Keep deltas short most of the time so events actually land
            let byte = if rng.gen_bool(0.3) {
                rng.gen_range(0..=0x20)
            } else {
                rng.gen_range(0..=255)
            };
            body.push(byte);
        }
        body.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        let mut bytes = b"MThd".to_vec();
        bytes.extend_from_slice(&6u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x01, 0x01, 0xE0]);
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&body);

        if let Ok(timeline) = MusicTimeline::from_midi_bytes("fuzz", &bytes, &config) {
            assert_well_formed(&timeline);
        }
    }
}

/// Flip bytes of a valid file
#[test]
fn fuzz_mutated_file() {
    let mut rng = rand::thread_rng();
    let config = AnalysisConfig::default();
    let original = smf(vec![arpeggio_track(2)]);

    for _ in 0..500 {
        let mut bytes = original.clone();
        for _ in 0..rng.gen_range(1..=8) {
            let index = rng.gen_range(0..bytes.len());
            bytes[index] = rng.r#gen();
        }
        if rng.gen_bool(0.2) {
            bytes.truncate(rng.gen_range(0..bytes.len()));
        }

        if let Ok(timeline) = MusicTimeline::from_midi_bytes("fuzz", &bytes, &config) {
            assert_well_formed(&timeline);
        }
    }
}

/// Random frame timing over a real timeline, including seeks and zero-length frames
#[test]
fn fuzz_playback_frames() {
    let mut rng = rand::thread_rng();
    let timeline =
        MusicTimeline::from_midi_bytes("fuzz", &smf(vec![arpeggio_track(4)]), &AnalysisConfig::default())
            .unwrap();
    let mut session = PlaybackSession::new(&timeline, Default::default());

    let mut time = 0.0;
    for _ in 0..5000 {
        if rng.gen_bool(0.01) {
            time = rng.gen_range(0.0..timeline.duration());
            session.seek(time);
            continue;
        }

        let dt = if rng.gen_bool(0.05) {
            0.0
        } else {
            rng.gen_range(0.001..0.1)
        };
        time += dt;
        let params = session.frame(time, dt);

        assert!((0.0..=1.0).contains(&params.drum_energy));
        assert!((0.0..=1.0).contains(&params.harmonic.tension));
        if dt == 0.0 {
            assert!(!params.beat.on_beat && !params.chord_changed && !params.note_onset);
        }
    }
}
