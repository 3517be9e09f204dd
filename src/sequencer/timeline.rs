// Timeline - Musical time representation
// Tempo and meter value types plus the change events read from a MIDI header

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default tempo used when a file carries no tempo events
pub const DEFAULT_BPM: f64 = 120.0;

/// Time signature (numerator/denominator)
/// Example: 4/4 time = TimeSignature { numerator: 4, denominator: 4 }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,   // Beats per bar (typically 3, 4, 5, 6, 7)
    pub denominator: u8, // Note value (4 = quarter note, 8 = eighth note)
}

impl TimeSignature {
    /// Common 4/4 time signature
    pub fn four_four() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Tempo in BPM (Beats Per Minute)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    bpm: f64,
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Tempo change point (time in seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEvent {
    pub time: f64,
    pub bpm: f64,
}

impl TempoEvent {
    pub fn new(time: f64, bpm: f64) -> Self {
        Self { time, bpm }
    }

    pub fn tempo(&self) -> Tempo {
        Tempo { bpm: self.bpm }
    }
}

impl Default for TempoEvent {
    fn default() -> Self {
        Self::new(0.0, DEFAULT_BPM)
    }
}

/// Meter change point (time in seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSignatureEvent {
    pub time: f64,
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSignatureEvent {
    pub fn new(time: f64, numerator: u8, denominator: u8) -> Self {
        Self {
            time,
            numerator,
            denominator,
        }
    }
}

impl Default for TimeSignatureEvent {
    fn default() -> Self {
        Self::new(0.0, 4, 4)
    }
}

/// Sort tempo events by time and insert the 120 BPM default at t=0 if the list is empty
pub fn normalize_tempo_events(mut events: Vec<TempoEvent>) -> Vec<TempoEvent> {
    events.retain(|e| e.time.is_finite() && e.bpm.is_finite() && e.bpm > 0.0);
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    if events.is_empty() {
        events.push(TempoEvent::default());
    }
    events
}

/// Sort time signature events by time and insert 4/4 at t=0 if the list is empty
pub fn normalize_time_signature_events(
    mut events: Vec<TimeSignatureEvent>,
) -> Vec<TimeSignatureEvent> {
    events.retain(|e| e.time.is_finite() && e.numerator > 0);
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    if events.is_empty() {
        events.push(TimeSignatureEvent::default());
    }
    events
}
