// MIDI Timeline - Library exports for the binary, tests and benchmarks

pub mod analysis;
pub mod config;
pub mod midi;
pub mod params;
pub mod sequencer;
pub mod timeline;

// Re-export commonly used types for convenience
pub use analysis::{ChordQuality, Key, KeyMode};
pub use config::{AnalysisConfig, Config, ConfigError, MapperConfig};
pub use midi::{DrumHit, MidiError, NoteEvent, ParsedMidi};
pub use params::{MusicParams, ParameterMapper, PlaybackSession};
pub use sequencer::{BeatClock, BeatState, TempoMap};
pub use timeline::{ChordEvent, MusicTimeline, TimelineBuilder, TimelineError};
