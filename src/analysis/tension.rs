// Tension model - Harmonic tension of a chord in the context of its key
//
// Four components, weighted and clamped to [0, 1]:
// - hierarchical: distance of the chord's degree from the tonic on the circle of fifths
// - dissonance: surface roughness of the chord quality
// - root motion: how far the root moved from the previous chord
// - tendency: pull of the degree towards resolution (dominant, leading tone)

use super::chord::ChordQuality;
use crate::config::TensionWeights;

/// Signed circle-of-fifths distance from the tonic, indexed by degree (0 = chromatic)
const FIFTHS_DISTANCE: [i8; 8] = [6, 0, 2, 4, -1, 1, 3, 5];

/// Tension of a root movement, indexed by the shortest chromatic interval (0-6)
const ROOT_MOTION_TENSION: [f64; 7] = [0.0, 0.6, 0.35, 0.3, 0.3, 0.1, 0.8];

/// Resolution pull, indexed by degree (0 = chromatic)
const TENDENCY: [f64; 8] = [0.5, 0.0, 0.3, 0.2, 0.25, 0.7, 0.2, 0.8];

const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

fn dissonance(quality: ChordQuality) -> f64 {
    match quality {
        ChordQuality::Major => 0.0,
        ChordQuality::Minor => 0.05,
        ChordQuality::Sus2 => 0.15,
        ChordQuality::Minor7 => 0.15,
        ChordQuality::Sus4 => 0.2,
        ChordQuality::Major7 => 0.2,
        ChordQuality::Dominant7 => 0.25,
        ChordQuality::Augmented => 0.3,
        ChordQuality::Diminished => 0.35,
        ChordQuality::HalfDiminished7 => 0.35,
        ChordQuality::Diminished7 => 0.40,
        ChordQuality::Unknown => 0.5,
    }
}

/// Shortest chromatic distance between two pitch classes (0-6)
pub fn root_interval(from: u8, to: u8) -> u8 {
    let up = (to % 12 + 12 - from % 12) % 12;
    up.min(12 - up)
}

/// Individual tension components, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TensionComponents {
    pub hierarchical: f64,
    pub dissonance: f64,
    pub root_motion: f64,
    pub tendency: f64,
}

impl TensionComponents {
    pub fn compute(degree: u8, quality: ChordQuality, root: u8, previous_root: Option<u8>) -> Self {
        let degree = degree.min(7) as usize;
        Self {
            hierarchical: (FIFTHS_DISTANCE[degree].unsigned_abs() as f64 / 6.0).min(1.0),
            dissonance: dissonance(quality),
            root_motion: previous_root
                .map(|prev| ROOT_MOTION_TENSION[root_interval(prev, root) as usize])
                .unwrap_or(0.0),
            tendency: TENDENCY[degree],
        }
    }

    pub fn combine(&self, weights: &TensionWeights) -> f64 {
        (self.hierarchical * weights.hierarchical
            + self.dissonance * weights.dissonance
            + self.root_motion * weights.root_motion
            + self.tendency * weights.tendency)
            .clamp(0.0, 1.0)
    }
}

/// Sequential tension scorer; remembers the previous chord root
#[derive(Debug, Clone)]
pub struct TensionModel {
    weights: TensionWeights,
    previous_root: Option<u8>,
}

impl TensionModel {
    pub fn new(weights: TensionWeights) -> Self {
        Self {
            weights,
            previous_root: None,
        }
    }

    /// Tension of the next chord in the progression
    ///
    /// Unknown chords score 0 and leave the previous root untouched.
    pub fn next(&mut self, degree: u8, quality: ChordQuality, root: u8) -> f64 {
        if quality.is_unknown() {
            return 0.0;
        }

        let tension = TensionComponents::compute(degree, quality, root, self.previous_root)
            .combine(&self.weights);
        self.previous_root = Some(root);
        tension
    }

    pub fn reset(&mut self) {
        self.previous_root = None;
    }
}

impl Default for TensionModel {
    fn default() -> Self {
        Self::new(TensionWeights::default())
    }
}

/// Roman numeral for a chord, e.g. "V7", "viiø7", "IVΔ7"
///
/// Chromatic roots (degree 0) get "?" as their numeral, unknown chords "N.C.".
pub fn roman_numeral(degree: u8, quality: ChordQuality) -> String {
    if quality.is_unknown() {
        return "N.C.".to_string();
    }

    let base = match degree {
        1..=7 => NUMERALS[degree as usize - 1],
        _ => "?",
    };
    let base = if quality.is_minor_family() {
        base.to_lowercase()
    } else {
        base.to_string()
    };

    let suffix = match quality {
        ChordQuality::Diminished => "°",
        ChordQuality::HalfDiminished7 => "ø7",
        ChordQuality::Major7 => "Δ7",
        ChordQuality::Dominant7 | ChordQuality::Minor7 => "7",
        ChordQuality::Diminished7 => "°7",
        ChordQuality::Augmented => "+",
        ChordQuality::Sus4 => "sus4",
        ChordQuality::Sus2 => "sus2",
        ChordQuality::Major | ChordQuality::Minor | ChordQuality::Unknown => "",
    };

    format!("{}{}", base, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tonic_major_has_no_tension() {
        let mut model = TensionModel::default();
        assert_eq!(model.next(1, ChordQuality::Major, 0), 0.0);
    }

    #[test]
    fn test_dominant_seventh_is_tenser_than_tonic() {
        let mut model = TensionModel::default();
        let tonic = model.next(1, ChordQuality::Major, 0);
        let dominant = model.next(5, ChordQuality::Dominant7, 7);
        assert!(dominant > tonic);

        // 0.4 * 1/6 + 0.25 * 0.25 + 0.2 * 0.1 + 0.15 * 0.7
        let expected = 0.4 / 6.0 + 0.0625 + 0.02 + 0.105;
        assert!((dominant - expected).abs() < 1e-12);
    }

    #[test]
    fn test_root_motion_uses_previous_root() {
        let tritone = TensionComponents::compute(1, ChordQuality::Major, 6, Some(0));
        let fifth = TensionComponents::compute(1, ChordQuality::Major, 7, Some(0));
        assert_eq!(tritone.root_motion, 0.8);
        assert_eq!(fifth.root_motion, 0.1);
        assert_eq!(
            TensionComponents::compute(1, ChordQuality::Major, 7, None).root_motion,
            0.0
        );
    }

    #[test]
    fn test_unknown_chords_do_not_move_the_root() {
        let mut model = TensionModel::default();
        model.next(1, ChordQuality::Major, 0);
        assert_eq!(model.next(0, ChordQuality::Unknown, 0), 0.0);
        let after = model.next(5, ChordQuality::Major, 7);
        let expected = TensionComponents::compute(5, ChordQuality::Major, 7, Some(0))
            .combine(&TensionWeights::default());
        assert_eq!(after, expected);
    }

    #[test]
    fn test_tension_is_bounded() {
        let heavy = TensionWeights {
            hierarchical: 5.0,
            dissonance: 5.0,
            root_motion: 5.0,
            tendency: 5.0,
        };
        let components = TensionComponents::compute(0, ChordQuality::Diminished7, 6, Some(0));
        assert_eq!(components.combine(&heavy), 1.0);

        for degree in 0..=7 {
            for quality in crate::analysis::chord::CHORD_TEMPLATES {
                for root in 0..12 {
                    let t = TensionComponents::compute(degree, quality, root, Some(3))
                        .combine(&TensionWeights::default());
                    assert!((0.0..=1.0).contains(&t));
                }
            }
        }
    }

    #[test]
    fn test_root_interval() {
        assert_eq!(root_interval(0, 7), 5);
        assert_eq!(root_interval(7, 0), 5);
        assert_eq!(root_interval(0, 6), 6);
        assert_eq!(root_interval(11, 1), 2);
        assert_eq!(root_interval(4, 4), 0);
    }

    #[test]
    fn test_roman_numerals() {
        assert_eq!(roman_numeral(1, ChordQuality::Major), "I");
        assert_eq!(roman_numeral(2, ChordQuality::Minor), "ii");
        assert_eq!(roman_numeral(5, ChordQuality::Dominant7), "V7");
        assert_eq!(roman_numeral(7, ChordQuality::HalfDiminished7), "viiø7");
        assert_eq!(roman_numeral(7, ChordQuality::Diminished), "vii°");
        assert_eq!(roman_numeral(4, ChordQuality::Major7), "IVΔ7");
        assert_eq!(roman_numeral(6, ChordQuality::Minor7), "vi7");
        assert_eq!(roman_numeral(7, ChordQuality::Diminished7), "vii°7");
        assert_eq!(roman_numeral(0, ChordQuality::Major), "?");
        assert_eq!(roman_numeral(3, ChordQuality::Unknown), "N.C.");
    }
}
