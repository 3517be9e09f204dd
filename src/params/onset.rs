// Onset tracker - Flags voices that started sounding since the previous frame

use crate::midi::VoiceKey;
use std::collections::HashSet;

/// Diffs the set of sounding voices against the previous frame
#[derive(Debug, Clone, Default)]
pub struct VoiceOnsetTracker {
    previous: HashSet<VoiceKey>,
    current: HashSet<VoiceKey>,
}

impl VoiceOnsetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sounding set and return how many voices are new
    pub fn update<I>(&mut self, sounding: I) -> usize
    where
        I: IntoIterator<Item = VoiceKey>,
    {
        self.update_with_stale(sounding, std::iter::empty())
    }

    /// Like `update`, but `stale` voices count as already sounding
    ///
    /// Used for voices whose attack is older than the lookback window.
    pub fn update_with_stale<I, S>(&mut self, sounding: I, stale: S) -> usize
    where
        I: IntoIterator<Item = VoiceKey>,
        S: IntoIterator<Item = VoiceKey>,
    {
        std::mem::swap(&mut self.previous, &mut self.current);
        self.current.clear();
        self.current.extend(sounding);
        self.previous.extend(stale);
        self.current.difference(&self.previous).count()
    }

    /// Voices sounding in the last frame
    pub fn sounding(&self) -> &HashSet<VoiceKey> {
        &self.current
    }

    pub fn reset(&mut self) {
        self.previous.clear();
        self.current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(channel: u8, midi: u8) -> VoiceKey {
        VoiceKey { channel, midi }
    }

    #[test]
    fn test_new_voices_count_once() {
        let mut tracker = VoiceOnsetTracker::new();
        assert_eq!(tracker.update([voice(0, 60), voice(0, 64)]), 2);
        assert_eq!(tracker.update([voice(0, 60), voice(0, 64)]), 0);
        assert_eq!(tracker.update([voice(0, 60), voice(0, 67)]), 1);
        assert_eq!(tracker.update([]), 0);
        assert!(tracker.sounding().is_empty());
    }

    #[test]
    fn test_channel_distinguishes_voices() {
        let mut tracker = VoiceOnsetTracker::new();
        tracker.update([voice(0, 60)]);
        assert_eq!(tracker.update([voice(1, 60)]), 1);
    }

    #[test]
    fn test_stale_voices_never_count() {
        let mut tracker = VoiceOnsetTracker::new();
        assert_eq!(
            tracker.update_with_stale([voice(0, 60), voice(0, 64)], [voice(0, 60)]),
            1
        );
        assert!(tracker.sounding().contains(&voice(0, 60)));
        assert_eq!(tracker.update([voice(0, 60), voice(0, 64)]), 0);
    }

    #[test]
    fn test_reset_forgets_previous_frame() {
        let mut tracker = VoiceOnsetTracker::new();
        tracker.update([voice(0, 60)]);
        tracker.reset();
        assert_eq!(tracker.update([voice(0, 60)]), 1);
    }
}
