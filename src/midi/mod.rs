// MIDI module
// File loading, note/drum event types and drum-track classification

pub mod drums;
pub mod event;
pub mod loader;

pub use event::{DrumHit, NoteEvent, Timed, VoiceKey};
pub use loader::{ParsedMidi, ParsedTrack, RawNote};

use thiserror::Error;

/// Errors raised before analysis starts; the analysis itself never fails
#[derive(Debug, Error)]
pub enum MidiError {
    #[error("Failed to parse MIDI file: {0}")]
    Parse(String),

    #[error("RIFF container holds no MThd chunk")]
    InvalidRiff,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MidiResult<T> = Result<T, MidiError>;
