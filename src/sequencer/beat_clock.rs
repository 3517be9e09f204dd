// Beat clock - Converts playback time into beat and bar phase
// Edge-triggered beat/bar flags, anticipation and arrival envelopes

use super::tempo_map::{TempoMap, TempoSegment};
use super::timeline::{DEFAULT_BPM, TempoEvent, TimeSignatureEvent};
use std::f64::consts::TAU;

/// Fraction of a beat (or bar) before the boundary over which anticipation ramps up
const ANTICIPATION_WINDOW: f64 = 0.25;

/// Exponential decay rate of the arrival envelope, per unit of phase
const ARRIVAL_DECAY: f64 = 6.0;

/// Largest phase below 1.0; `rem_euclid` can round up to the divisor
const ALMOST_ONE: f64 = 1.0 - f64::EPSILON;

/// Per-frame beat and bar state
///
/// Recomputed on every call; only the previous counters persist in [`BeatClock`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BeatState {
    /// Position within the current beat, in [0, 1)
    pub beat_phase: f64,
    /// Position within the current bar, in [0, 1)
    pub bar_phase: f64,
    pub bpm: f64,
    /// Seconds per beat
    pub beat_duration: f64,
    pub beats_per_bar: f64,
    /// Beat within the bar (0-based)
    pub beat_index: u32,
    /// True only on the frame where the beat counter increments
    pub on_beat: bool,
    /// True only on the frame where the bar counter increments
    pub on_bar: bool,
    /// Confidence of the timing source (always 1.0 for MIDI)
    pub stability: f64,
    /// Seconds until the next beat
    pub next_beat_in: f64,
    /// Seconds until the next bar
    pub next_bar_in: f64,
    pub beat_anticipation: f64,
    pub bar_anticipation: f64,
    pub beat_arrival: f64,
    pub bar_arrival: f64,
    pub beat_groove: f64,
    pub bar_groove: f64,
    /// Absolute beat position
    pub total_beats: f64,
    /// Absolute bar position
    pub total_bars: f64,
}

/// Rises from 0 to 1 over the last part of the cycle
fn anticipation(phase: f64) -> f64 {
    let ramp = ((phase - (1.0 - ANTICIPATION_WINDOW)) / ANTICIPATION_WINDOW).clamp(0.0, 1.0);
    ramp * ramp
}

/// Peaks at 1 on the boundary and decays afterwards
fn arrival(phase: f64) -> f64 {
    (-phase * ARRIVAL_DECAY).exp()
}

/// Raised cosine, 1 on the boundary and 0 half way through
fn groove(phase: f64) -> f64 {
    0.5 + 0.5 * (TAU * phase).cos()
}

/// Tempo-map aware beat clock
///
/// `update` must be called at most once per frame; call `reset` on every
/// non-monotonic jump of playback time.
#[derive(Debug, Clone)]
pub struct BeatClock {
    tempo_map: TempoMap,
    prev_total_beats: f64,
    prev_total_bars: f64,
}

impl BeatClock {
    /// Clock over a MIDI tempo map
    pub fn from_tempo_map(
        tempo_events: &[TempoEvent],
        time_signature_events: &[TimeSignatureEvent],
    ) -> Self {
        Self::with_map(TempoMap::new(tempo_events, time_signature_events))
    }

    /// Constant tempo clock, used when no song is loaded
    pub fn idle(bpm: f64, beats_per_bar: u8) -> Self {
        Self::with_map(TempoMap::constant(bpm, beats_per_bar as f64))
    }

    pub fn with_map(tempo_map: TempoMap) -> Self {
        Self {
            tempo_map,
            prev_total_beats: 0.0,
            prev_total_bars: 0.0,
        }
    }

    pub fn tempo_map(&self) -> &TempoMap {
        &self.tempo_map
    }

    /// Swap in a new tempo map (live tempo or meter change) and reset edge state
    pub fn set_tempo_map(
        &mut self,
        tempo_events: &[TempoEvent],
        time_signature_events: &[TimeSignatureEvent],
    ) {
        self.tempo_map = TempoMap::new(tempo_events, time_signature_events);
        self.reset();
    }

    /// Zero the edge-detection counters
    pub fn reset(&mut self) {
        self.prev_total_beats = 0.0;
        self.prev_total_bars = 0.0;
    }

    /// Re-prime the edge-detection counters at `time` without firing any edge
    pub fn seek(&mut self, time: f64) {
        let state = self.peek(time);
        self.prev_total_beats = state.total_beats;
        self.prev_total_bars = state.total_bars;
    }

    /// Advance to `current_time` and compute the frame state
    ///
    /// Edge flags fire only when `dt > 0` and the integer counter went up.
    /// The previous counters are always overwritten, so a second call with the
    /// same arguments reports no edges.
    pub fn update(&mut self, current_time: f64, dt: f64) -> BeatState {
        let mut state = self.peek(current_time);

        state.on_beat = dt > 0.0 && state.total_beats.floor() > self.prev_total_beats.floor();
        state.on_bar = dt > 0.0 && state.total_bars.floor() > self.prev_total_bars.floor();

        self.prev_total_beats = state.total_beats;
        self.prev_total_bars = state.total_bars;

        state
    }

    /// Frame state at `time` without touching the clock; edge flags are always false
    pub fn peek(&self, time: f64) -> BeatState {
        compute_state(self.tempo_map.find_segment(time), time)
    }
}

impl Default for BeatClock {
    fn default() -> Self {
        Self::idle(DEFAULT_BPM, 4)
    }
}

fn compute_state(segment: &TempoSegment, time: f64) -> BeatState {
    let beats_per_bar = segment.beats_per_bar;
    let total_beats = segment.total_beats(time);
    let total_bars = segment.total_bars(total_beats);

    let beat_phase = total_beats - total_beats.floor();
    let bar_phase = (total_beats.rem_euclid(beats_per_bar) / beats_per_bar).min(ALMOST_ONE);
    let beat_index = (total_beats.floor().rem_euclid(beats_per_bar) as u32)
        .min(beats_per_bar as u32 - 1);

    let beat_duration = segment.beat_duration();
    let bar_duration = segment.bar_duration();

    BeatState {
        beat_phase,
        bar_phase,
        bpm: segment.bpm,
        beat_duration,
        beats_per_bar: segment.beats_per_bar,
        beat_index,
        on_beat: false,
        on_bar: false,
        stability: 1.0,
        next_beat_in: (1.0 - beat_phase) * beat_duration,
        next_bar_in: (1.0 - bar_phase) * bar_duration,
        beat_anticipation: anticipation(beat_phase),
        bar_anticipation: anticipation(bar_phase),
        beat_arrival: arrival(beat_phase),
        bar_arrival: arrival(bar_phase),
        beat_groove: groove(beat_phase),
        bar_groove: groove(bar_phase),
        total_beats,
        total_bars,
    }
}
