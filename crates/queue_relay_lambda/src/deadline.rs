use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Time left before the runtime deadline, expressed in epoch milliseconds.
///
/// Returns `None` when the runtime supplied no deadline (`0`), and
/// `Some(Duration::ZERO)` once the deadline has already passed.
pub fn remaining_until(deadline_epoch_ms: u64, now: SystemTime) -> Option<Duration> {
    if deadline_epoch_ms == 0 {
        return None;
    }
    let deadline = UNIX_EPOCH + Duration::from_millis(deadline_epoch_ms);
    Some(deadline.duration_since(now).unwrap_or(Duration::ZERO))
}
