// Sequencer module
// Tempo map, musical time representation and the beat clock

pub mod beat_clock;
pub mod tempo_map;
pub mod timeline;

pub use beat_clock::{BeatClock, BeatState};
pub use tempo_map::{TempoMap, TempoSegment};
pub use timeline::{Tempo, TempoEvent, TimeSignature, TimeSignatureEvent};
