// Parameter mapper - Streams timeline events into per-frame control parameters
//
// Cursors into the timeline's sorted note, drum and chord lists only ever move
// forward. Each frame processes the events that became due since the previous
// frame; events older than the lookback window are skipped instead of fired,
// so a dropped frame or a long stall never produces a burst of stale hits.
// Time jumping backwards requires `reset` (or `seek`).

use super::onset::VoiceOnsetTracker;
use super::search::{binary_search_first_ge, binary_search_time};
use super::smoothing::{HarmonicSmoother, HarmonicVector};
use crate::analysis::chord::ChordQuality;
use crate::config::MapperConfig;
use crate::midi::{NoteEvent, Timed, VoiceKey};
use crate::sequencer::beat_clock::BeatState;
use crate::timeline::{ChordEvent, MusicTimeline};

/// Per-frame parameters handed to visual effects
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MusicParams {
    pub time: f64,
    pub beat: BeatState,

    pub chord_quality: ChordQuality,
    pub chord_root: u8,
    pub chord_degree: u8,
    /// Raw tension of the current chord
    pub chord_tension: f64,
    /// True only on the frame the chord cursor moved
    pub chord_changed: bool,
    /// Seconds until the next chord starts, None after the last one
    pub next_chord_in: Option<f64>,
    /// Smoothed towards the current chord
    pub harmonic: HarmonicVector,

    /// Highest sounding non-drum note
    pub melody_pitch_class: Option<u8>,
    pub melody_velocity: f64,
    /// Lowest sounding non-drum note
    pub bass_pitch_class: Option<u8>,
    pub bass_velocity: f64,
    pub active_notes: usize,
    /// True on frames where at least one voice started
    pub note_onset: bool,
    pub onset_count: usize,

    /// Peak-held drum energy with exponential decay, [0, 1]
    pub drum_energy: f64,
    /// True on frames where a drum hit landed inside the lookback window
    pub drum_hit: bool,
}

/// Edge flags produced by one cursor advance
#[derive(Debug, Clone, Copy, Default)]
struct FrameEdges {
    chord_changed: bool,
    onset_count: usize,
    drum_hit: bool,
}

fn harmonic_target(chord: &ChordEvent, previous: HarmonicVector) -> HarmonicVector {
    if chord.quality.is_unknown() {
        return HarmonicVector {
            tension: 0.0,
            root_position: previous.root_position,
            degree_position: 0.0,
            brightness: 0.5,
        };
    }

    HarmonicVector {
        tension: chord.tension,
        root_position: chord.root as f64 / 12.0,
        degree_position: chord.degree as f64 / 7.0,
        brightness: if chord.quality.is_minor_family() {
            0.0
        } else {
            1.0
        },
    }
}

fn neutral_harmony() -> HarmonicVector {
    HarmonicVector {
        brightness: 0.5,
        ..Default::default()
    }
}

/// Stateful per-frame mapper, one per playback session
#[derive(Debug, Clone)]
pub struct ParameterMapper {
    config: MapperConfig,

    /// Number of notes already passed by the playhead
    last_note_index: usize,
    /// Number of drum hits already passed by the playhead
    last_drum_index: usize,
    /// Chord under the playhead, None before the first chord
    last_chord_index: Option<usize>,

    /// Indices of sounding non-drum notes
    active: Vec<usize>,
    onsets: VoiceOnsetTracker,
    harmonic: HarmonicSmoother,
    drum_energy: f64,
}

impl ParameterMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            config,
            last_note_index: 0,
            last_drum_index: 0,
            last_chord_index: None,
            active: Vec::new(),
            onsets: VoiceOnsetTracker::new(),
            harmonic: HarmonicSmoother::new(neutral_harmony(), config.harmonic_rate),
            drum_energy: 0.0,
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Zero every cursor, the onset history and all smoothed state
    pub fn reset(&mut self) {
        self.last_note_index = 0;
        self.last_drum_index = 0;
        self.last_chord_index = None;
        self.active.clear();
        self.onsets.reset();
        self.harmonic.reset(neutral_harmony());
        self.drum_energy = 0.0;
    }

    /// Jump to `time` without firing any onset, hit or chord change
    pub fn seek(&mut self, timeline: &MusicTimeline, time: f64) {
        self.reset();

        let notes = timeline.notes();
        self.last_note_index = passed_count(notes, time);
        self.active = (0..self.last_note_index)
            .filter(|&i| !notes[i].is_drum && notes[i].end_time() > time)
            .collect();
        self.onsets
            .update(self.active.iter().map(|&i| notes[i].voice_key()));

        self.last_drum_index = passed_count(timeline.drums(), time);

        let chords = timeline.chords();
        self.last_chord_index = binary_search_time(chords, time);
        if let Some(chord) = self.last_chord_index.and_then(|i| chords.get(i)) {
            let target = harmonic_target(chord, neutral_harmony());
            self.harmonic.reset(target);
        }
    }

    /// Advance to `time` and compute this frame's parameters
    ///
    /// Must be called at most once per frame with non-decreasing `time`.
    /// With `dt <= 0` nothing advances and every edge flag reads false.
    pub fn update(
        &mut self,
        timeline: &MusicTimeline,
        beat: &BeatState,
        time: f64,
        dt: f64,
    ) -> MusicParams {
        if dt <= 0.0 {
            return self.snapshot(timeline, beat, time);
        }

        let edges = FrameEdges {
            onset_count: self.advance_notes(timeline.notes(), time),
            drum_hit: self.advance_drums(timeline, time, dt),
            chord_changed: self.advance_chords(timeline.chords(), time),
        };
        let harmonic = self.harmonic.advance(dt);
        let chord = self
            .last_chord_index
            .and_then(|i| timeline.chords().get(i));

        self.compose(timeline, beat, time, chord, harmonic, edges)
    }

    /// Parameters at `time` from the current state, without advancing anything
    pub fn snapshot(&self, timeline: &MusicTimeline, beat: &BeatState, time: f64) -> MusicParams {
        self.compose(
            timeline,
            beat,
            time,
            timeline.chord_at(time),
            self.harmonic.get(),
            FrameEdges::default(),
        )
    }

    /// Move the note cursor and return the number of new voice onsets
    fn advance_notes(&mut self, notes: &[NoteEvent], time: f64) -> usize {
        let lookback_start = time - self.config.lookback;
        let mut just_started: Vec<VoiceKey> = Vec::new();
        let mut stale: Vec<VoiceKey> = Vec::new();

        while let Some(note) = notes.get(self.last_note_index) {
            if note.time > time {
                break;
            }
            if !note.is_drum {
                if note.end_time() > time {
                    self.active.push(self.last_note_index);
                    if note.time < lookback_start {
                        stale.push(note.voice_key());
                    }
                } else if note.time >= lookback_start {
                    // Shorter than a frame: still counts as an attack
                    just_started.push(note.voice_key());
                }
            }
            self.last_note_index += 1;
        }

        self.active
            .retain(|&i| notes.get(i).is_some_and(|n| n.end_time() > time));

        let sounding = self
            .active
            .iter()
            .filter_map(|&i| notes.get(i))
            .map(NoteEvent::voice_key)
            .chain(just_started);
        self.onsets.update_with_stale(sounding, stale)
    }

    /// Move the drum cursor, fold due hits into the energy envelope
    fn advance_drums(&mut self, timeline: &MusicTimeline, time: f64, dt: f64) -> bool {
        let drums = timeline.drums();
        let lookback_start = time - self.config.lookback;
        let mut peak: f64 = 0.0;
        let mut hit = false;

        while let Some(drum) = drums.get(self.last_drum_index) {
            if drum.time > time {
                break;
            }
            if drum.time >= lookback_start {
                peak = peak.max(drum.energy);
                hit = true;
            }
            self.last_drum_index += 1;
        }

        let decayed = self.drum_energy * (-self.config.drum_decay * dt).exp();
        self.drum_energy = decayed.max(peak).clamp(0.0, 1.0);
        hit
    }

    /// Move the chord cursor; retarget the harmonic smoother when it moved
    fn advance_chords(&mut self, chords: &[ChordEvent], time: f64) -> bool {
        let mut index = self.last_chord_index;
        loop {
            let next = index.map_or(0, |i| i + 1);
            match chords.get(next) {
                Some(chord) if chord.time <= time => index = Some(next),
                _ => break,
            }
        }

        if index == self.last_chord_index {
            return false;
        }
        self.last_chord_index = index;

        if let Some(chord) = index.and_then(|i| chords.get(i)) {
            let target = harmonic_target(chord, self.harmonic.get());
            self.harmonic.set_target(target);
        }
        true
    }

    fn compose(
        &self,
        timeline: &MusicTimeline,
        beat: &BeatState,
        time: f64,
        chord: Option<&ChordEvent>,
        harmonic: HarmonicVector,
        edges: FrameEdges,
    ) -> MusicParams {
        let notes = timeline.notes();
        let mut melody: Option<&NoteEvent> = None;
        let mut bass: Option<&NoteEvent> = None;
        let mut active_notes = 0;
        for note in self.active.iter().filter_map(|&i| notes.get(i)) {
            if !note.is_sounding_at(time) {
                continue;
            }
            active_notes += 1;
            if melody.is_none_or(|m| note.midi > m.midi) {
                melody = Some(note);
            }
            if bass.is_none_or(|b| note.midi < b.midi) {
                bass = Some(note);
            }
        }

        MusicParams {
            time,
            beat: *beat,
            chord_quality: chord.map_or(ChordQuality::Unknown, |c| c.quality),
            chord_root: chord.map_or(0, |c| c.root),
            chord_degree: chord.map_or(0, |c| c.degree),
            chord_tension: chord.map_or(0.0, |c| c.tension),
            chord_changed: edges.chord_changed,
            next_chord_in: next_chord_in(timeline.chords(), time),
            harmonic,
            melody_pitch_class: melody.map(NoteEvent::pitch_class),
            melody_velocity: melody.map_or(0.0, NoteEvent::velocity_unit),
            bass_pitch_class: bass.map(NoteEvent::pitch_class),
            bass_velocity: bass.map_or(0.0, NoteEvent::velocity_unit),
            active_notes,
            note_onset: edges.onset_count > 0,
            onset_count: edges.onset_count,
            drum_energy: self.drum_energy,
            drum_hit: edges.drum_hit,
        }
    }
}

impl Default for ParameterMapper {
    fn default() -> Self {
        Self::new(MapperConfig::default())
    }
}

/// Number of events with `time <= target`
fn passed_count<T: Timed>(events: &[T], target: f64) -> usize {
    binary_search_time(events, target).map_or(0, |i| i + 1)
}

/// Seconds until the first chord starting strictly after `time`
fn next_chord_in(chords: &[ChordEvent], time: f64) -> Option<f64> {
    let mut index = binary_search_first_ge(chords, time);
    while chords.get(index).is_some_and(|c| c.time <= time) {
        index += 1;
    }
    chords.get(index).map(|c| c.time - time)
}
