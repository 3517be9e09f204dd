// Music timeline - Immutable result of analysing one MIDI file
// Built once per loaded file; a re-analysis produces a new timeline

pub mod builder;

pub use builder::TimelineBuilder;

use crate::analysis::chord::{ChordQuality, chord_name};
use crate::analysis::key::{Key, KeyMode};
use crate::config::AnalysisConfig;
use crate::midi::{DrumHit, MidiError, NoteEvent, ParsedMidi, Timed};
use crate::params::search::binary_search_time;
use crate::sequencer::beat_clock::BeatClock;
use crate::sequencer::tempo_map::TempoMap;
use crate::sequencer::timeline::{TempoEvent, TimeSignature, TimeSignatureEvent};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("MIDI error: {0}")]
    Midi(#[from] MidiError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One harmonic event: a chord that holds until the next event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    /// Earliest note onset of the window the chord was detected in
    pub time: f64,
    pub quality: ChordQuality,
    /// Root pitch class (0-11)
    pub root: u8,
    /// Scale degree of the root (1-7), 0 when chromatic
    pub degree: u8,
    /// Harmonic tension in [0, 1]
    pub tension: f64,
    /// Roman numeral, e.g. "V7"
    pub numeral: String,
}

impl ChordEvent {
    /// Lead-sheet name, e.g. "Am"
    pub fn name(&self, use_flats: bool) -> String {
        chord_name(self.root, self.quality, use_flats)
    }
}

impl Timed for ChordEvent {
    fn time(&self) -> f64 {
        self.time
    }
}

/// Analysed MIDI performance
///
/// All event lists are sorted by time. Fields are only readable from outside
/// the crate; the builder is the only producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicTimeline {
    pub(crate) name: String,
    /// Initial tempo in BPM
    pub(crate) tempo: f64,
    /// Initial time signature
    pub(crate) time_signature: TimeSignature,
    pub(crate) tempo_events: Vec<TempoEvent>,
    pub(crate) time_signature_events: Vec<TimeSignatureEvent>,
    pub(crate) key: u8,
    pub(crate) key_mode: KeyMode,
    pub(crate) use_flats: bool,
    /// Seconds
    pub(crate) duration: f64,
    pub(crate) chords: Vec<ChordEvent>,
    pub(crate) drums: Vec<DrumHit>,
    pub(crate) notes: Vec<NoteEvent>,
}

impl MusicTimeline {
    /// Parse and analyse raw MIDI bytes
    pub fn from_midi_bytes(
        name: &str,
        bytes: &[u8],
        config: &AnalysisConfig,
    ) -> Result<Self, TimelineError> {
        let midi = ParsedMidi::parse(bytes)?;
        Ok(TimelineBuilder::new(*config).build(name, &midi))
    }

    /// Load and analyse a MIDI file; the file stem becomes the fallback name
    pub fn load(path: &Path, config: &AnalysisConfig) -> Result<Self, TimelineError> {
        let midi = ParsedMidi::load(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(TimelineBuilder::new(*config).build(&name, &midi))
    }

    pub fn to_json(&self) -> Result<String, TimelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json_data: &str) -> Result<Self, TimelineError> {
        Ok(serde_json::from_str(json_data)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn tempo_events(&self) -> &[TempoEvent] {
        &self.tempo_events
    }

    pub fn time_signature_events(&self) -> &[TimeSignatureEvent] {
        &self.time_signature_events
    }

    pub fn key(&self) -> Key {
        Key::new(self.key, self.key_mode)
    }

    pub fn key_mode(&self) -> KeyMode {
        self.key_mode
    }

    pub fn use_flats(&self) -> bool {
        self.use_flats
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn chords(&self) -> &[ChordEvent] {
        &self.chords
    }

    pub fn drums(&self) -> &[DrumHit] {
        &self.drums
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    /// Chord sounding at `time`, if any chord has started yet
    pub fn chord_at(&self, time: f64) -> Option<&ChordEvent> {
        binary_search_time(&self.chords, time).map(|index| &self.chords[index])
    }

    /// Segment index over this timeline's tempo map
    pub fn tempo_map(&self) -> TempoMap {
        TempoMap::new(&self.tempo_events, &self.time_signature_events)
    }

    /// Fresh beat clock following this timeline's tempo map
    pub fn beat_clock(&self) -> BeatClock {
        BeatClock::with_map(self.tempo_map())
    }
}
