// MIDI file loader - Standard MIDI File parsing via midly
// Converts ticks to seconds through the file's tempo map and pairs note on/off

use super::MidiError;
use crate::sequencer::timeline::{
    TempoEvent, TimeSignatureEvent, normalize_tempo_events, normalize_time_signature_events,
};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use tracing::{debug, warn};

/// Tempo assumed before the first SetTempo event (120 BPM)
const DEFAULT_MICROS_PER_BEAT: f64 = 500_000.0;

/// A note as read from a track, before drum classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawNote {
    pub time: f64,
    pub duration: f64,
    pub midi: u8,
    pub velocity: u8,
    pub channel: u8,
}

/// One track of a parsed file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTrack {
    pub name: String,
    pub instrument_name: String,
    /// First channel a note was played on
    pub channel: Option<u8>,
    pub notes: Vec<RawNote>,
}

/// A Standard MIDI File reduced to what the analysis needs
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMidi {
    /// Name of the first track, if any (usually the song title)
    pub name: Option<String>,
    pub tracks: Vec<ParsedTrack>,
    /// Sorted, never empty
    pub tempo_events: Vec<TempoEvent>,
    /// Sorted, never empty
    pub time_signature_events: Vec<TimeSignatureEvent>,
    /// Length of the longest track in seconds
    pub duration: f64,
}

impl ParsedMidi {
    /// Parse raw file bytes (plain SMF or RIFF-wrapped RMID)
    pub fn parse(bytes: &[u8]) -> Result<Self, MidiError> {
        let smf_bytes = unwrap_riff(bytes)?;
        let smf = Smf::parse(smf_bytes).map_err(|e| MidiError::Parse(e.to_string()))?;
        Ok(Self::from_smf(&smf))
    }

    /// Read and parse a file from disk
    pub fn load(path: &Path) -> Result<Self, MidiError> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    fn from_smf(smf: &Smf) -> Self {
        if smf.tracks.is_empty() {
            warn!("MIDI file contains no tracks");
        }

        let clock = TickClock::from_smf(smf);

        let tempo_events = normalize_tempo_events(
            clock
                .tempo_points
                .iter()
                .map(|p| TempoEvent::new(p.seconds, 60_000_000.0 / p.micros_per_beat))
                .collect(),
        );

        let mut time_signature_events = Vec::new();
        for track in &smf.tracks {
            let mut tick: u64 = 0;
            for event in track {
                tick += event.delta.as_int() as u64;
                if let TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, denom_pow, _, _)) =
                    event.kind
                {
                    time_signature_events.push(TimeSignatureEvent::new(
                        clock.seconds(tick),
                        numerator.max(1),
                        1u8 << denom_pow.min(7),
                    ));
                }
            }
        }
        let time_signature_events = normalize_time_signature_events(time_signature_events);

        let mut duration: f64 = 0.0;
        let tracks: Vec<ParsedTrack> = smf
            .tracks
            .iter()
            .map(|track| {
                let (parsed, end_tick) = parse_track(track, &clock);
                duration = duration.max(clock.seconds(end_tick));
                parsed
            })
            .collect();

        let name = tracks
            .first()
            .map(|t| t.name.clone())
            .filter(|n| !n.is_empty());

        debug!(
            tracks = tracks.len(),
            tempo_events = tempo_events.len(),
            time_signatures = time_signature_events.len(),
            duration,
            "parsed MIDI file"
        );

        Self {
            name,
            tracks,
            tempo_events,
            time_signature_events,
            duration,
        }
    }
}

/// Slice an RMID (RIFF) container down to its embedded SMF
///
/// Plain SMF bytes are returned untouched.
pub fn unwrap_riff(bytes: &[u8]) -> Result<&[u8], MidiError> {
    if !bytes.starts_with(b"RIFF") {
        return Ok(bytes);
    }

    let start = bytes
        .windows(4)
        .position(|w| w == b"MThd")
        .ok_or(MidiError::InvalidRiff)?;
    Ok(&bytes[start..])
}

#[derive(Debug, Clone, Copy)]
struct TempoPoint {
    tick: u64,
    seconds: f64,
    micros_per_beat: f64,
}

/// Tick to seconds conversion for one file
struct TickClock {
    /// Metrical: ticks per quarter note. Timecode: None.
    ppq: Option<f64>,
    ticks_per_second: f64,
    tempo_points: Vec<TempoPoint>,
}

impl TickClock {
    fn from_smf(smf: &Smf) -> Self {
        let mut changes: Vec<(u64, f64)> = Vec::new();
        for track in &smf.tracks {
            let mut tick: u64 = 0;
            for event in track {
                tick += event.delta.as_int() as u64;
                if let TrackEventKind::Meta(MetaMessage::Tempo(micros)) = event.kind {
                    let micros = micros.as_int() as f64;
                    if micros > 0.0 {
                        changes.push((tick, micros));
                    }
                }
            }
        }
        // Stable sort keeps file order for changes on the same tick
        changes.sort_by_key(|(tick, _)| *tick);

        let (ppq, ticks_per_second) = match smf.header.timing {
            Timing::Metrical(ppq) => (Some(ppq.as_int().max(1) as f64), 0.0),
            Timing::Timecode(fps, subframes) => {
                (None, (fps.as_f32() as f64 * subframes as f64).max(1.0))
            }
        };

        let mut clock = Self {
            ppq,
            ticks_per_second,
            tempo_points: vec![TempoPoint {
                tick: 0,
                seconds: 0.0,
                micros_per_beat: DEFAULT_MICROS_PER_BEAT,
            }],
        };

        for (tick, micros_per_beat) in changes {
            let seconds = clock.seconds(tick);
            match clock.tempo_points.last_mut() {
                Some(last) if last.tick == tick => last.micros_per_beat = micros_per_beat,
                _ => clock.tempo_points.push(TempoPoint {
                    tick,
                    seconds,
                    micros_per_beat,
                }),
            }
        }

        clock
    }

    fn seconds(&self, tick: u64) -> f64 {
        let Some(ppq) = self.ppq else {
            return tick as f64 / self.ticks_per_second;
        };

        let index = self
            .tempo_points
            .partition_point(|p| p.tick <= tick)
            .saturating_sub(1);
        let point = &self.tempo_points[index];
        point.seconds + (tick - point.tick) as f64 / ppq * point.micros_per_beat / 1_000_000.0
    }
}

/// Pair note on/off events of one track; returns the track and its final tick
fn parse_track(track: &[midly::TrackEvent], clock: &TickClock) -> (ParsedTrack, u64) {
    let mut parsed = ParsedTrack::default();
    let mut open: HashMap<(u8, u8), VecDeque<(u64, u8)>> = HashMap::new();
    let mut closed: Vec<(u64, u64, u8, u8, u8)> = Vec::new();
    let mut tick: u64 = 0;

    for event in track {
        tick += event.delta.as_int() as u64;

        match event.kind {
            TrackEventKind::Midi { channel, message } => {
                let channel = channel.as_int();
                match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        if parsed.channel.is_none() {
                            parsed.channel = Some(channel);
                        }
                        open.entry((channel, key.as_int()))
                            .or_default()
                            .push_back((tick, vel.as_int()));
                    }
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        let key = key.as_int();
                        if let Some((start, velocity)) = open
                            .get_mut(&(channel, key))
                            .and_then(|starts| starts.pop_front())
                        {
                            closed.push((start, tick, key, velocity, channel));
                        }
                    }
                    _ => {}
                }
            }
            TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
                if parsed.name.is_empty() {
                    parsed.name = String::from_utf8_lossy(name).trim().to_string();
                }
            }
            TrackEventKind::Meta(MetaMessage::InstrumentName(name)) => {
                if parsed.instrument_name.is_empty() {
                    parsed.instrument_name = String::from_utf8_lossy(name).trim().to_string();
                }
            }
            _ => {}
        }
    }

    // Notes still held at end of track close there
    for ((channel, key), starts) in open {
        for (start, velocity) in starts {
            closed.push((start, tick, key, velocity, channel));
        }
    }

    parsed.notes = closed
        .into_iter()
        .map(|(start, end, midi, velocity, channel)| {
            let time = clock.seconds(start);
            RawNote {
                time,
                duration: (clock.seconds(end) - time).max(0.0),
                midi,
                velocity,
                channel,
            }
        })
        .collect();
    parsed
        .notes
        .sort_by(|a, b| a.time.total_cmp(&b.time).then(a.midi.cmp(&b.midi)));

    (parsed, tick)
}
