// Drum detection - Per-track drum classification and GM drum-hit energy

/// General MIDI percussion channel (channel 10, 0-based)
pub const DRUM_CHANNEL: u8 = 9;

/// Track or instrument name fragments that mark a drum track
const DRUM_KEYWORDS: [&str; 9] = [
    "drum", "perc", "kit", "beat", "snare", "kick", "hat", "cymbal", "tom",
];

/// Classify a track as drums from its channel and names
pub fn is_drum_track(channel: Option<u8>, track_name: &str, instrument_name: &str) -> bool {
    if channel == Some(DRUM_CHANNEL) {
        return true;
    }

    let track_name = track_name.to_lowercase();
    let instrument_name = instrument_name.to_lowercase();
    DRUM_KEYWORDS
        .iter()
        .any(|keyword| track_name.contains(keyword) || instrument_name.contains(keyword))
}

/// Relative weight of a GM percussion key
fn drum_weight(midi: u8) -> f64 {
    match midi {
        35 | 36 => 1.0,                     // kicks
        38 | 40 => 1.0,                     // snares
        37 | 39 => 0.8,                     // side stick, clap
        41 | 43 | 45 | 47 | 48 | 50 => 0.8, // toms
        49 | 51 | 52 | 53 | 55 | 57 | 59 => 0.6, // cymbals
        42 | 44 | 46 => 0.4,                // hi-hats
        _ => 0.5,
    }
}

/// Energy of a drum hit in [0, 1]
pub fn drum_energy(midi: u8, velocity: u8) -> f64 {
    (velocity as f64 / 127.0 * drum_weight(midi)).clamp(0.0, 1.0)
}
