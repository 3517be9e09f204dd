// MIDI event types
// Flat, time-sorted note and drum events produced when a timeline is built

use serde::{Deserialize, Serialize};

/// Anything positioned on the playback timeline (seconds)
pub trait Timed {
    fn time(&self) -> f64;
}

/// A single note, drum notes included
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    /// Onset in seconds
    pub time: f64,
    /// Length in seconds
    pub duration: f64,
    /// MIDI note number (0-127, where 60 = C4)
    pub midi: u8,
    /// MIDI velocity (1-127)
    pub velocity: u8,
    pub channel: u8,
    pub is_drum: bool,
}

impl NoteEvent {
    pub fn end_time(&self) -> f64 {
        self.time + self.duration
    }

    /// Pitch class (0 = C ... 11 = B)
    pub fn pitch_class(&self) -> u8 {
        self.midi % 12
    }

    /// Velocity normalised to [0, 1]
    pub fn velocity_unit(&self) -> f64 {
        self.velocity as f64 / 127.0
    }

    /// Check if this note is sounding at `time`
    pub fn is_sounding_at(&self, time: f64) -> bool {
        time >= self.time && time < self.end_time()
    }

    /// Identity of the sounding voice, used for onset detection
    pub fn voice_key(&self) -> VoiceKey {
        VoiceKey {
            channel: self.channel,
            midi: self.midi,
        }
    }
}

impl Timed for NoteEvent {
    fn time(&self) -> f64 {
        self.time
    }
}

/// `channel:midi` pair identifying a sounding voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceKey {
    pub channel: u8,
    pub midi: u8,
}

/// A drum hit with its energy in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrumHit {
    pub time: f64,
    pub energy: f64,
}

impl Timed for DrumHit {
    fn time(&self) -> f64 {
        self.time
    }
}
