// Tempo map - Constant tempo/meter segments with cumulative beat and bar counters
// Built once per tempo map, queried every frame in O(log n)

use super::timeline::{DEFAULT_BPM, TempoEvent, TimeSignatureEvent};
use tracing::debug;

/// Breakpoints closer than this are treated as the same instant
const BREAKPOINT_EPSILON: f64 = 1e-9;

/// A maximal interval of constant tempo and time signature
///
/// `start_beat` / `start_bar` count the beats and bars elapsed before the
/// segment begins, so positions stay continuous across tempo and meter changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoSegment {
    pub start_time: f64,
    pub bpm: f64,
    pub beats_per_bar: f64,
    pub start_beat: f64,
    pub start_bar: f64,
}

impl TempoSegment {
    /// Duration of one beat in seconds
    pub fn beat_duration(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Duration of one bar in seconds
    pub fn bar_duration(&self) -> f64 {
        self.beat_duration() * self.beats_per_bar
    }

    /// Beats elapsed inside this segment at `time` (negative before its start)
    pub fn beats_since_start(&self, time: f64) -> f64 {
        (time - self.start_time) * self.bpm / 60.0
    }

    /// Absolute beat position at `time`
    pub fn total_beats(&self, time: f64) -> f64 {
        self.start_beat + self.beats_since_start(time)
    }

    /// Absolute bar position for an absolute beat position inside this segment
    ///
    /// Bars are counted in this segment's meter from beat 0, shifted so the
    /// whole-bar count lines up with `start_bar`.
    pub fn total_bars(&self, total_beats: f64) -> f64 {
        total_beats / self.beats_per_bar
            + (self.start_bar - (self.start_beat / self.beats_per_bar).floor())
    }

    fn constant(bpm: f64, beats_per_bar: f64) -> Self {
        Self {
            start_time: 0.0,
            bpm,
            beats_per_bar,
            start_beat: 0.0,
            start_bar: 0.0,
        }
    }
}

/// Sorted segment index over a tempo map
///
/// Always holds at least one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    segments: Vec<TempoSegment>,
}

impl TempoMap {
    /// Build the segment index from time-sorted tempo and time signature events
    pub fn new(tempo_events: &[TempoEvent], time_signature_events: &[TimeSignatureEvent]) -> Self {
        let mut breakpoints: Vec<f64> = tempo_events
            .iter()
            .map(|e| e.time)
            .chain(time_signature_events.iter().map(|e| e.time))
            .filter(|t| t.is_finite())
            .collect();
        breakpoints.sort_by(|a, b| a.total_cmp(b));
        breakpoints.dedup_by(|a, b| (*a - *b).abs() < BREAKPOINT_EPSILON);

        if breakpoints.is_empty() {
            return Self::constant(DEFAULT_BPM, 4.0);
        }

        let mut segments: Vec<TempoSegment> = Vec::with_capacity(breakpoints.len());
        let mut cumulative_beats = 0.0;
        let mut cumulative_bars = 0.0;

        for &time in &breakpoints {
            if let Some(prev) = segments.last() {
                let beats = prev.beats_since_start(time);
                cumulative_beats += beats;
                cumulative_bars += beats / prev.beats_per_bar;
            }

            segments.push(TempoSegment {
                start_time: time,
                bpm: tempo_at(tempo_events, time),
                beats_per_bar: beats_per_bar_at(time_signature_events, time),
                start_beat: cumulative_beats,
                start_bar: cumulative_bars,
            });
        }

        debug!(segments = segments.len(), "built tempo map");
        Self { segments }
    }

    /// Single segment map at a constant tempo and meter
    pub fn constant(bpm: f64, beats_per_bar: f64) -> Self {
        let bpm = if bpm.is_finite() && bpm > 0.0 {
            bpm
        } else {
            DEFAULT_BPM
        };
        let beats_per_bar = if beats_per_bar.is_finite() && beats_per_bar >= 1.0 {
            beats_per_bar
        } else {
            4.0
        };
        Self {
            segments: vec![TempoSegment::constant(bpm, beats_per_bar)],
        }
    }

    /// Segment active at `time`
    ///
    /// Rightmost segment with `start_time <= time`; times before the first
    /// segment clamp to segment 0.
    pub fn find_segment(&self, time: f64) -> &TempoSegment {
        let index = self
            .segments
            .partition_point(|s| s.start_time <= time)
            .saturating_sub(1);
        &self.segments[index]
    }

    /// Start of the first segment after `time`, None inside the last segment
    pub fn next_boundary(&self, time: f64) -> Option<f64> {
        let index = self.segments.partition_point(|s| s.start_time <= time);
        self.segments.get(index).map(|s| s.start_time)
    }

    pub fn segments(&self) -> &[TempoSegment] {
        &self.segments
    }
}

impl Default for TempoMap {
    fn default() -> Self {
        Self::constant(DEFAULT_BPM, 4.0)
    }
}

/// BPM of the last tempo event at or before `time` (120 if none)
pub fn tempo_at(events: &[TempoEvent], time: f64) -> f64 {
    events
        .iter()
        .rev()
        .find(|e| e.time <= time)
        .map(|e| e.bpm)
        .unwrap_or(DEFAULT_BPM)
}

/// Numerator of the last time signature at or before `time` (4 if none)
pub fn beats_per_bar_at(events: &[TimeSignatureEvent], time: f64) -> f64 {
    events
        .iter()
        .rev()
        .find(|e| e.time <= time)
        .map(|e| e.numerator.max(1) as f64)
        .unwrap_or(4.0)
}
