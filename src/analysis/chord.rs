// Chord detector - Template matching over a weighted pitch-class profile
//
// Every (root, template) pair is scored by the share of the window's weight
// that falls on chord tones, minus a penalty for non-chord weight and for
// template tones that are missing, plus a bonus for roots inside the key.
// Windows that are silent or match nothing well report `Unknown`.

use super::key::{PitchClassProfile, pitch_class_name};
use crate::config::AnalysisConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this total weight a window is treated as silent
const SILENCE_WEIGHT: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChordQuality {
    #[serde(rename = "major")]
    Major,
    #[serde(rename = "minor")]
    Minor,
    #[serde(rename = "dim")]
    Diminished,
    #[serde(rename = "aug")]
    Augmented,
    #[serde(rename = "sus4")]
    Sus4,
    #[serde(rename = "sus2")]
    Sus2,
    #[serde(rename = "maj7")]
    Major7,
    #[serde(rename = "dom7")]
    Dominant7,
    #[serde(rename = "min7")]
    Minor7,
    #[serde(rename = "hdim7")]
    HalfDiminished7,
    #[serde(rename = "dim7")]
    Diminished7,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

/// Template library in matching order
pub const CHORD_TEMPLATES: [ChordQuality; 11] = [
    ChordQuality::Major,
    ChordQuality::Minor,
    ChordQuality::Diminished,
    ChordQuality::Augmented,
    ChordQuality::Sus4,
    ChordQuality::Sus2,
    ChordQuality::Major7,
    ChordQuality::Dominant7,
    ChordQuality::Minor7,
    ChordQuality::HalfDiminished7,
    ChordQuality::Diminished7,
];

impl ChordQuality {
    /// Intervals in semitones from the root
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Sus4 => &[0, 5, 7],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::HalfDiminished7 => &[0, 3, 6, 10],
            ChordQuality::Diminished7 => &[0, 3, 6, 9],
            ChordQuality::Unknown => &[],
        }
    }

    /// Subtracted from the match score; negative values favour the quality
    pub fn preference(&self) -> f64 {
        match self {
            ChordQuality::Dominant7 => -0.02,
            ChordQuality::Augmented | ChordQuality::Sus4 | ChordQuality::Sus2 => 0.02,
            ChordQuality::Diminished | ChordQuality::Diminished7 => 0.01,
            _ => 0.0,
        }
    }

    /// Qualities written with a lower-case Roman numeral
    pub fn is_minor_family(&self) -> bool {
        matches!(
            self,
            ChordQuality::Minor
                | ChordQuality::Minor7
                | ChordQuality::Diminished
                | ChordQuality::HalfDiminished7
                | ChordQuality::Diminished7
        )
    }

    /// Lead-sheet suffix, e.g. "m7" for a minor seventh
    pub fn symbol(&self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Sus4 => "sus4",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::HalfDiminished7 => "m7b5",
            ChordQuality::Diminished7 => "dim7",
            ChordQuality::Unknown => "?",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ChordQuality::Unknown)
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChordQuality::Major => "major",
            ChordQuality::Minor => "minor",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Sus4 => "sus4",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Dominant7 => "dom7",
            ChordQuality::Minor7 => "min7",
            ChordQuality::HalfDiminished7 => "hdim7",
            ChordQuality::Diminished7 => "dim7",
            ChordQuality::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Lead-sheet chord name, e.g. "Bbm7"; "N.C." for unknown chords
pub fn chord_name(root: u8, quality: ChordQuality, use_flats: bool) -> String {
    if quality.is_unknown() {
        return "N.C.".to_string();
    }
    format!("{}{}", pitch_class_name(root, use_flats), quality.symbol())
}

/// Best template match for one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordMatch {
    pub quality: ChordQuality,
    pub root: u8,
    pub score: f64,
}

impl ChordMatch {
    fn unknown(score: f64) -> Self {
        Self {
            quality: ChordQuality::Unknown,
            root: 0,
            score,
        }
    }
}

/// Scores windows against the template library
#[derive(Debug, Clone, Copy)]
pub struct ChordDetector {
    threshold: f64,
    non_chord_penalty: f64,
    diatonic_bonus: f64,
    missing_tone_penalty: f64,
    missing_tone_ratio: f64,
}

impl ChordDetector {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            threshold: config.chord_threshold,
            non_chord_penalty: config.non_chord_penalty,
            diatonic_bonus: config.diatonic_bonus,
            missing_tone_penalty: config.missing_tone_penalty,
            missing_tone_ratio: config.missing_tone_ratio,
        }
    }

    /// Score of one root/template pair against a window
    pub fn score(
        &self,
        weights: &PitchClassProfile,
        total: f64,
        root: u8,
        quality: ChordQuality,
        diatonic: &[bool; 12],
    ) -> f64 {
        let mut match_weight = 0.0;
        let mut missing = 0usize;
        for interval in quality.intervals() {
            let weight = weights[((root + interval) % 12) as usize];
            match_weight += weight;
            if weight < total * self.missing_tone_ratio {
                missing += 1;
            }
        }
        let non_chord_weight = total - match_weight;

        let bonus = if diatonic[(root % 12) as usize] {
            self.diatonic_bonus
        } else {
            0.0
        };

        match_weight / total - self.non_chord_penalty * non_chord_weight / total
            - self.missing_tone_penalty * missing as f64
            + bonus
            - quality.preference()
    }

    /// Best match over all 132 root/template combinations
    ///
    /// Ties keep the first candidate (roots ascending, templates in library order).
    pub fn detect(&self, weights: &PitchClassProfile, diatonic: &[bool; 12]) -> ChordMatch {
        let total: f64 = weights.iter().sum();
        if total.is_nan() || total < SILENCE_WEIGHT {
            return ChordMatch::unknown(0.0);
        }

        let mut best = ChordMatch::unknown(f64::NEG_INFINITY);
        for root in 0..12u8 {
            for quality in CHORD_TEMPLATES {
                let score = self.score(weights, total, root, quality, diatonic);
                if score > best.score {
                    best = ChordMatch {
                        quality,
                        root,
                        score,
                    };
                }
            }
        }

        if best.score < self.threshold {
            return ChordMatch::unknown(best.score);
        }
        best
    }
}

impl Default for ChordDetector {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}
