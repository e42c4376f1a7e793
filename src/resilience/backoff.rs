//! Exponential backoff schedule.

use std::time::Duration;

/// Calculate the delay before retry `attempt` (0-indexed).
///
/// The schedule is exponential in the given unit: `unit * 2^attempt`,
/// i.e. with a one-second unit the delays are 1s, 2s, 4s, ...
pub fn backoff_delay(attempt: u32, unit: Duration) -> Duration {
    unit.saturating_mul(2u32.saturating_pow(attempt))
}
