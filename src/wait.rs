use std::thread;
use std::time::Duration;

/// Call `check` up to `attempts` times, sleeping `interval` between
/// calls, until it returns `true`.
///
/// Returns the 1-based attempt that succeeded, or `None` once the
/// window is exhausted. No sleep follows the last attempt.
pub fn poll_until(
    attempts: u32,
    interval: Duration,
    mut check: impl FnMut(u32) -> bool,
) -> Option<u32> {
    for attempt in 1..=attempts {
        if check(attempt) {
            return Some(attempt);
        }
        if attempt < attempts && !interval.is_zero() {
            thread::sleep(interval);
        }
    }
    None
}
