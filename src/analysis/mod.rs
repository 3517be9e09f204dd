// Analysis module
// Key finding, chord detection and the harmonic tension model

pub mod chord;
pub mod key;
pub mod tension;

pub use chord::{ChordDetector, ChordMatch, ChordQuality, chord_name};
pub use key::{Key, KeyMode, PitchClassProfile, detect_key};
pub use tension::{TensionComponents, TensionModel, roman_numeral};
