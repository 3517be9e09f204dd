// Binary search over time-sorted event lists

use crate::midi::Timed;

/// Index of the last event with `time <= target`, None if every event is later
pub fn binary_search_time<T: Timed>(events: &[T], target: f64) -> Option<usize> {
    events.partition_point(|e| e.time() <= target).checked_sub(1)
}

/// Index of the first event with `time >= target`, `events.len()` if none
pub fn binary_search_first_ge<T: Timed>(events: &[T], target: f64) -> usize {
    events.partition_point(|e| e.time() < target)
}
