// Playback session - Beat clock and parameter mapper advanced together
// Seeking and resetting always touch both, so their state never diverges

use super::mapper::{MusicParams, ParameterMapper};
use crate::config::MapperConfig;
use crate::sequencer::beat_clock::BeatClock;
use crate::timeline::MusicTimeline;

/// Per-frame driver for one timeline
///
/// Independent sessions over the same timeline do not share any state.
#[derive(Debug, Clone)]
pub struct PlaybackSession<'a> {
    timeline: &'a MusicTimeline,
    clock: BeatClock,
    mapper: ParameterMapper,
}

impl<'a> PlaybackSession<'a> {
    pub fn new(timeline: &'a MusicTimeline, config: MapperConfig) -> Self {
        Self {
            timeline,
            clock: timeline.beat_clock(),
            mapper: ParameterMapper::new(config),
        }
    }

    pub fn timeline(&self) -> &MusicTimeline {
        self.timeline
    }

    pub fn clock(&self) -> &BeatClock {
        &self.clock
    }

    /// Advance one animation frame
    pub fn frame(&mut self, time: f64, dt: f64) -> MusicParams {
        let beat = self.clock.update(time, dt);
        self.mapper.update(self.timeline, &beat, time, dt)
    }

    /// Parameters at `time` without advancing anything
    pub fn peek(&self, time: f64) -> MusicParams {
        let beat = self.clock.peek(time);
        self.mapper.snapshot(self.timeline, &beat, time)
    }

    /// Jump to `time` (scrub, rewind); no edge fires on the next frame for
    /// events before `time`
    pub fn seek(&mut self, time: f64) {
        self.clock.reset();
        self.clock.seek(time);
        self.mapper.seek(self.timeline, time);
    }

    /// Back to the start of the song
    pub fn reset(&mut self) {
        self.clock.reset();
        self.mapper.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::chord::ChordQuality;
    use crate::analysis::key::KeyMode;
    use crate::midi::DrumHit;
    use crate::sequencer::timeline::{TempoEvent, TimeSignature, TimeSignatureEvent};
    use crate::timeline::ChordEvent;

    fn four_bar_timeline() -> MusicTimeline {
        MusicTimeline {
            name: "session".to_string(),
            tempo: 120.0,
            time_signature: TimeSignature::four_four(),
            tempo_events: vec![TempoEvent::default()],
            time_signature_events: vec![TimeSignatureEvent::default()],
            key: 0,
            key_mode: KeyMode::Major,
            use_flats: false,
            duration: 8.0,
            chords: vec![ChordEvent {
                time: 0.0,
                quality: ChordQuality::Major,
                root: 0,
                degree: 1,
                tension: 0.0,
                numeral: "I".to_string(),
            }],
            drums: (0..16)
                .map(|beat| DrumHit {
                    time: beat as f64 * 0.5,
                    energy: 1.0,
                })
                .collect(),
            notes: Vec::new(),
        }
    }

    #[test]
    fn test_frames_report_beats_and_hits() {
        let timeline = four_bar_timeline();
        let mut session = PlaybackSession::new(&timeline, MapperConfig::default());

        let dt = 1.0 / 60.0;
        let mut beats = 0;
        let mut bars = 0;
        let mut hits = 0;
        for frame in 1..=240 {
            let params = session.frame(frame as f64 / 60.0, dt);
            beats += params.beat.on_beat as usize;
            bars += params.beat.on_bar as usize;
            hits += params.drum_hit as usize;
        }

        // 4 seconds at 120 BPM: beats at 0.5 .. 4.0, bars at 2.0 and 4.0
        assert_eq!(beats, 8);
        assert_eq!(bars, 2);
        // Hits at 0.0 .. 4.0; the one at 0.0 lands in the first frame's lookback
        assert_eq!(hits, 9);
    }

    #[test]
    fn test_seek_suppresses_edges() {
        let timeline = four_bar_timeline();
        let mut session = PlaybackSession::new(&timeline, MapperConfig::default());

        session.frame(0.1, 0.1);
        session.seek(3.0);
        let params = session.frame(3.01, 0.01);
        assert!(!params.beat.on_beat);
        assert!(!params.beat.on_bar);
        assert!(!params.drum_hit);
        assert!(!params.chord_changed);
        assert_eq!(params.chord_degree, 1);
    }

    #[test]
    fn test_peek_is_pure() {
        let timeline = four_bar_timeline();
        let mut session = PlaybackSession::new(&timeline, MapperConfig::default());

        let peeked = session.peek(0.51);
        assert!(!peeked.beat.on_beat);
        assert!(!peeked.drum_hit);

        session.frame(0.49, 0.49);
        let params = session.frame(0.51, 0.02);
        assert!(params.beat.on_beat);
        assert!(params.drum_hit);
    }

    #[test]
    fn test_reset_replays_from_start() {
        let timeline = four_bar_timeline();
        let mut session = PlaybackSession::new(&timeline, MapperConfig::default());

        session.frame(1.0, 1.0);
        session.reset();
        let params = session.frame(0.01, 0.01);
        assert!(params.chord_changed);
        assert!(params.drum_hit);
    }
}
