// Key finder - Krumhansl-Schmuckler key-profile correlation
//
// The pitch-class histogram (duration x velocity per pitch class) is rotated to
// each of the 12 candidate tonics and correlated (Pearson) with the major and
// minor probe-tone profiles. The best correlation wins, with a small bias
// towards major so relative major/minor ties resolve to major.
//
// Reference: Krumhansl, C.L. (1990). Cognitive Foundations of Musical Pitch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Krumhansl-Kessler major key profile (C major, C = index 0)
pub const KRUMHANSL_MAJOR: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor key profile (C minor, C = index 0)
pub const KRUMHANSL_MINOR: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Guards the correlation against zero variance
const CORRELATION_EPSILON: f64 = 1e-10;

const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const MINOR_SCALE: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// 12-bin pitch-class weight vector (C = 0 ... B = 11)
pub type PitchClassProfile = [f64; 12];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    #[default]
    Major,
    Minor,
}

impl KeyMode {
    /// Scale intervals from the tonic
    pub fn scale(&self) -> &'static [u8; 7] {
        match self {
            KeyMode::Major => &MAJOR_SCALE,
            KeyMode::Minor => &MINOR_SCALE,
        }
    }
}

impl fmt::Display for KeyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMode::Major => write!(f, "major"),
            KeyMode::Minor => write!(f, "minor"),
        }
    }
}

/// Detected key: tonic pitch class and mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Key {
    pub tonic: u8,
    pub mode: KeyMode,
}

impl Key {
    pub fn new(tonic: u8, mode: KeyMode) -> Self {
        Self {
            tonic: tonic % 12,
            mode,
        }
    }

    /// Scale degree (1-7) of a pitch class, 0 when it is outside the scale
    pub fn degree_of(&self, pitch_class: u8) -> u8 {
        let interval = (pitch_class % 12 + 12 - self.tonic) % 12;
        self.mode
            .scale()
            .iter()
            .position(|&step| step == interval)
            .map(|index| index as u8 + 1)
            .unwrap_or(0)
    }

    /// Membership mask of the key's scale, indexed by pitch class
    pub fn diatonic_set(&self) -> [bool; 12] {
        let mut set = [false; 12];
        for step in self.mode.scale() {
            set[((self.tonic + step) % 12) as usize] = true;
        }
        set
    }

    /// Whether the key is conventionally spelled with flats
    pub fn uses_flats(&self) -> bool {
        match self.mode {
            // F, Bb, Eb, Ab, Db, Gb
            KeyMode::Major => matches!(self.tonic, 5 | 10 | 3 | 8 | 1 | 6),
            // D, G, C, F, Bb, Eb
            KeyMode::Minor => matches!(self.tonic, 2 | 7 | 0 | 5 | 10 | 3),
        }
    }

    /// Name of the key, e.g. "Bb major"
    pub fn name(&self) -> String {
        format!(
            "{} {}",
            pitch_class_name(self.tonic, self.uses_flats()),
            self.mode
        )
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Name of a pitch class with sharp or flat spelling
pub fn pitch_class_name(pitch_class: u8, use_flats: bool) -> &'static str {
    let names = if use_flats { &FLAT_NAMES } else { &SHARP_NAMES };
    names[(pitch_class % 12) as usize]
}

/// Pearson correlation between two 12-bin vectors
fn pearson(x: &[f64; 12], y: &[f64; 12]) -> f64 {
    let mean_x = x.iter().sum::<f64>() / 12.0;
    let mean_y = y.iter().sum::<f64>() / 12.0;

    let mut numerator = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y.iter()) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        numerator += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    numerator / ((var_x * var_y).sqrt() + CORRELATION_EPSILON)
}

/// Histogram rotated so that `tonic` lands on index 0
fn rotate(histogram: &PitchClassProfile, tonic: usize) -> [f64; 12] {
    let mut rotated = [0.0; 12];
    for (i, slot) in rotated.iter_mut().enumerate() {
        *slot = histogram[(i + tonic) % 12];
    }
    rotated
}

/// Pick the key whose profile best correlates with the histogram
///
/// An all-zero histogram correlates 0 with everything, so the major bias
/// resolves it to C major.
pub fn detect_key(histogram: &PitchClassProfile, major_bias: f64) -> Key {
    let mut best = Key::default();
    let mut best_score = f64::NEG_INFINITY;

    for tonic in 0..12 {
        let rotated = rotate(histogram, tonic);
        let candidates = [
            (KeyMode::Major, pearson(&rotated, &KRUMHANSL_MAJOR) + major_bias),
            (KeyMode::Minor, pearson(&rotated, &KRUMHANSL_MINOR)),
        ];

        for (mode, score) in candidates {
            if score > best_score {
                best_score = score;
                best = Key::new(tonic as u8, mode);
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIAS: f64 = 0.02;

    #[test]
    fn test_c_major_weighted_histogram() {
        let histogram = [10.0, 0.0, 2.0, 0.0, 7.0, 5.0, 0.0, 9.0, 0.0, 3.0, 0.0, 1.0];
        assert_eq!(detect_key(&histogram, BIAS), Key::new(0, KeyMode::Major));
    }

    #[test]
    fn test_silent_histogram_defaults_to_c_major() {
        assert_eq!(detect_key(&[0.0; 12], BIAS), Key::new(0, KeyMode::Major));
    }

    #[test]
    fn test_a_minor_histogram() {
        let histogram = [1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 3.0, 0.0, 1.0];
        assert_eq!(detect_key(&histogram, BIAS), Key::new(9, KeyMode::Minor));
    }

    #[test]
    fn test_transposed_profile_is_found() {
        // Major profile shifted to D
        let histogram = rotate(&KRUMHANSL_MAJOR, 10);
        assert_eq!(detect_key(&histogram, BIAS), Key::new(2, KeyMode::Major));
    }

    #[test]
    fn test_degrees() {
        let c_major = Key::new(0, KeyMode::Major);
        assert_eq!(c_major.degree_of(0), 1);
        assert_eq!(c_major.degree_of(7), 5);
        assert_eq!(c_major.degree_of(11), 7);
        assert_eq!(c_major.degree_of(1), 0);

        let a_minor = Key::new(9, KeyMode::Minor);
        assert_eq!(a_minor.degree_of(9), 1);
        assert_eq!(a_minor.degree_of(0), 3);
        assert_eq!(a_minor.degree_of(4), 5);
    }

    #[test]
    fn test_diatonic_set() {
        let set = Key::new(7, KeyMode::Major).diatonic_set();
        assert!(set[6]); // F#
        assert!(!set[5]); // F
        assert_eq!(set.iter().filter(|&&b| b).count(), 7);
    }

    #[test]
    fn test_flat_spelling() {
        assert!(Key::new(5, KeyMode::Major).uses_flats());
        assert!(!Key::new(7, KeyMode::Major).uses_flats());
        assert!(Key::new(2, KeyMode::Minor).uses_flats());
        assert_eq!(Key::new(10, KeyMode::Major).to_string(), "Bb major");
        assert_eq!(Key::new(6, KeyMode::Minor).to_string(), "F# minor");
    }
}
