// Timeline builder - Turns a parsed MIDI file into a MusicTimeline
// Drum split, key detection, windowed chord detection, tension and numerals

use super::{ChordEvent, MusicTimeline};
use crate::analysis::chord::{ChordDetector, ChordQuality};
use crate::analysis::key::{Key, PitchClassProfile, detect_key};
use crate::analysis::tension::{TensionModel, roman_numeral};
use crate::config::AnalysisConfig;
use crate::midi::drums::{DRUM_CHANNEL, drum_energy, is_drum_track};
use crate::midi::{DrumHit, NoteEvent, ParsedMidi, ParsedTrack};
use crate::params::search::binary_search_first_ge;
use crate::sequencer::tempo_map::TempoMap;
use crate::sequencer::timeline::{TempoEvent, TimeSignature, TimeSignatureEvent};
use tracing::{debug, info};

/// Shortest chord window, guards against degenerate tempo maps
const MIN_WINDOW_SECONDS: f64 = 0.01;

/// Chord change before tension and numeral are attached
#[derive(Debug, Clone, Copy, PartialEq)]
struct DetectedChord {
    time: f64,
    quality: ChordQuality,
    root: u8,
}

#[derive(Debug, Clone, Default)]
pub struct TimelineBuilder {
    config: AnalysisConfig,
}

impl TimelineBuilder {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Analyse a parsed file
    ///
    /// `name` falls back to the file's first track name, then "Untitled".
    pub fn build(&self, name: &str, midi: &ParsedMidi) -> MusicTimeline {
        let (notes, drums) = split_tracks(&midi.tracks);

        let histogram = pitch_class_histogram(&notes);
        let key = detect_key(&histogram, self.config.key_major_bias);
        debug!(key = %key, "detected key");

        let tempo_events = midi.tempo_events.clone();
        let time_signature_events = midi.time_signature_events.clone();
        let tempo_map = TempoMap::new(&tempo_events, &time_signature_events);

        let duration = notes
            .iter()
            .map(NoteEvent::end_time)
            .fold(midi.duration, f64::max);

        let detected = self.detect_chords(&notes, &tempo_map, key, duration);
        let chords = self.annotate_chords(&detected, key);

        let name = if !name.trim().is_empty() {
            name.trim().to_string()
        } else {
            midi.name.clone().unwrap_or_else(|| "Untitled".to_string())
        };

        let tempo = tempo_events
            .first()
            .map(|e| e.bpm)
            .unwrap_or(TempoEvent::default().bpm);
        let time_signature = time_signature_events
            .first()
            .map(|e| TimeSignature {
                numerator: e.numerator,
                denominator: e.denominator,
            })
            .unwrap_or_default();

        info!(
            name = %name,
            key = %key,
            chords = chords.len(),
            notes = notes.len(),
            drums = drums.len(),
            duration,
            "built music timeline"
        );

        MusicTimeline {
            name,
            tempo,
            time_signature,
            tempo_events: non_empty_or_default(tempo_events),
            time_signature_events: non_empty_or_default::<TimeSignatureEvent>(
                time_signature_events,
            ),
            key: key.tonic,
            key_mode: key.mode,
            use_flats: key.uses_flats(),
            duration,
            chords,
            drums,
            notes,
        }
    }

    /// Windowed chord detection with coalescing of repeated chords
    ///
    /// Windows are `window_bars` long at the tempo and meter in force at the
    /// window start. A chord is stamped with the earliest note onset inside
    /// its window, or the window start when nothing starts there.
    fn detect_chords(
        &self,
        notes: &[NoteEvent],
        tempo_map: &TempoMap,
        key: Key,
        duration: f64,
    ) -> Vec<DetectedChord> {
        let harmonic: Vec<NoteEvent> = notes.iter().filter(|n| !n.is_drum).copied().collect();
        let longest = harmonic.iter().map(|n| n.duration).fold(0.0, f64::max);
        let diatonic = key.diatonic_set();
        let detector = ChordDetector::new(&self.config);

        let mut chords: Vec<DetectedChord> = Vec::new();
        let mut windows = 0usize;
        let mut window_start = 0.0;

        while window_start < duration {
            let segment = tempo_map.find_segment(window_start);
            let window_length =
                (segment.bar_duration() * self.config.window_bars).max(MIN_WINDOW_SECONDS);
            let mut window_end = window_start + window_length;

            // Only notes starting within `longest` of the window can overlap it
            let first = binary_search_first_ge(&harmonic, window_start - longest);
            let last = binary_search_first_ge(&harmonic, window_end);

            let mut weights: PitchClassProfile = [0.0; 12];
            let mut onset: Option<f64> = None;
            // Earliest time at which the window content can change
            let mut change = harmonic.get(last).map_or(duration, |n| n.time);
            let mut steady = true;
            for note in &harmonic[first..last] {
                let overlap = note.end_time().min(window_end) - note.time.max(window_start);
                if overlap > 0.0 {
                    weights[note.pitch_class() as usize] += overlap * note.velocity_unit();
                    steady &= note.time <= window_start && note.end_time() >= window_end;
                    change = change.min(note.end_time());
                }
                if onset.is_none() && note.time >= window_start {
                    onset = Some(note.time);
                }
            }

            let found = detector.detect(&weights, &diatonic);
            let repeated = chords
                .last()
                .is_some_and(|prev| prev.quality == found.quality && prev.root == found.root);
            if !repeated {
                chords.push(DetectedChord {
                    time: onset.unwrap_or(window_start),
                    quality: found.quality,
                    root: found.root,
                });
            }

            // Windows up to the next change would repeat this one; step over them
            if steady {
                if let Some(boundary) = tempo_map.next_boundary(window_start) {
                    change = change.min(boundary);
                }
                let skipped = ((change - window_end) / window_length).floor();
                if skipped >= 1.0 {
                    window_end += skipped * window_length;
                }
            }

            windows += 1;
            window_start = window_end;
        }

        debug!(windows, chords = chords.len(), "detected chords");
        chords
    }

    /// Attach degree, tension and Roman numeral in one forward pass
    fn annotate_chords(&self, detected: &[DetectedChord], key: Key) -> Vec<ChordEvent> {
        let mut tension_model = TensionModel::new(self.config.tension);

        detected
            .iter()
            .map(|chord| {
                let degree = if chord.quality.is_unknown() {
                    0
                } else {
                    key.degree_of(chord.root)
                };
                ChordEvent {
                    time: chord.time,
                    quality: chord.quality,
                    root: chord.root,
                    degree,
                    tension: tension_model.next(degree, chord.quality, chord.root),
                    numeral: roman_numeral(degree, chord.quality),
                }
            })
            .collect()
    }
}

fn non_empty_or_default<T: Default>(mut events: Vec<T>) -> Vec<T> {
    if events.is_empty() {
        events.push(T::default());
    }
    events
}

/// Flatten all tracks into time-sorted notes and drum hits
///
/// A note counts as a drum if its track is classified as drums or it was
/// played on the GM percussion channel.
pub fn split_tracks(tracks: &[ParsedTrack]) -> (Vec<NoteEvent>, Vec<DrumHit>) {
    let mut notes = Vec::new();
    let mut drums = Vec::new();

    for track in tracks {
        let drum_track = is_drum_track(track.channel, &track.name, &track.instrument_name);

        for raw in &track.notes {
            let is_drum = drum_track || raw.channel == DRUM_CHANNEL;
            notes.push(NoteEvent {
                time: raw.time,
                duration: raw.duration,
                midi: raw.midi,
                velocity: raw.velocity,
                channel: raw.channel,
                is_drum,
            });
            if is_drum {
                drums.push(DrumHit {
                    time: raw.time,
                    energy: drum_energy(raw.midi, raw.velocity),
                });
            }
        }
    }

    notes.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.midi.cmp(&b.midi)));
    drums.sort_by(|a, b| a.time.total_cmp(&b.time));
    (notes, drums)
}

/// Duration x velocity weighted pitch-class histogram of the non-drum notes
pub fn pitch_class_histogram(notes: &[NoteEvent]) -> PitchClassProfile {
    let mut histogram = [0.0; 12];
    for note in notes.iter().filter(|n| !n.is_drum) {
        histogram[note.pitch_class() as usize] += note.duration * note.velocity_unit();
    }
    histogram
}
