// Standard MIDI File writer for integration tests
// Format 1, 480 PPQ, events given at absolute ticks

#![allow(dead_code)]

pub const PPQ: u32 = 480;

fn variable_length(mut value: u32) -> Vec<u8> {
    let mut bytes = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        bytes.push(((value & 0x7F) as u8) | 0x80);
        value >>= 7;
    }
    bytes.reverse();
    bytes
}

/// One MTrk chunk
#[derive(Default)]
pub struct TrackBuilder {
    /// (tick, sort order, raw event bytes); note offs sort before note ons
    events: Vec<(u32, u8, Vec<u8>)>,
}

impl TrackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        let mut event = vec![0xFF, 0x03, name.len() as u8];
        event.extend_from_slice(name.as_bytes());
        self.events.push((0, 0, event));
        self
    }

    pub fn tempo(mut self, tick: u32, bpm: f64) -> Self {
        let micros = (60_000_000.0 / bpm).round() as u32;
        let bytes = micros.to_be_bytes();
        self.events
            .push((tick, 0, vec![0xFF, 0x51, 0x03, bytes[1], bytes[2], bytes[3]]));
        self
    }

    /// `denominator_power` is log2 of the denominator (2 for x/4)
    pub fn time_signature(mut self, tick: u32, numerator: u8, denominator_power: u8) -> Self {
        self.events.push((
            tick,
            0,
            vec![0xFF, 0x58, 0x04, numerator, denominator_power, 24, 8],
        ));
        self
    }

    pub fn note(mut self, tick: u32, length: u32, channel: u8, key: u8, velocity: u8) -> Self {
        self.events
            .push((tick, 2, vec![0x90 | channel, key, velocity]));
        self.events
            .push((tick + length, 1, vec![0x80 | channel, key, 0]));
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.events.sort_by_key(|(tick, order, _)| (*tick, *order));

        let mut body = Vec::new();
        let mut last_tick = 0;
        for (tick, _, event) in &self.events {
            body.extend(variable_length(tick - last_tick));
            body.extend_from_slice(event);
            last_tick = *tick;
        }
        body.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        let mut chunk = b"MTrk".to_vec();
        chunk.extend_from_slice(&(body.len() as u32).to_be_bytes());
        chunk.extend(body);
        chunk
    }
}

pub fn smf(tracks: Vec<TrackBuilder>) -> Vec<u8> {
    let mut bytes = b"MThd".to_vec();
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&1u16.to_be_bytes());
    bytes.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&(PPQ as u16).to_be_bytes());
    for track in tracks {
        bytes.extend(track.build());
    }
    bytes
}

/// C4 E4 G4 C5 quarter notes on channel 0 for `bars` bars of 4/4
pub fn arpeggio_track(bars: u32) -> TrackBuilder {
    let pitches = [60, 64, 67, 72];
    (0..bars * 4).fold(
        TrackBuilder::new()
            .name("Arpeggio")
            .tempo(0, 120.0)
            .time_signature(0, 4, 2),
        |track, beat| track.note(beat * PPQ, PPQ, 0, pitches[(beat % 4) as usize], 100),
    )
}
