use chrono::Utc;

use kronos_core::constants::{CLOCK_TOLERANCE_SECONDS, FINALITY_INTERVAL_SECONDS};
use kronos_core::types::{Timestamp, Window};

use crate::error::TemporalError;

/// The UTC boundary clock: wall-clock time divided into fixed-length
/// windows (`FINALITY_INTERVAL_SECONDS` each), counted from the Unix
/// epoch. Leader lotteries, VDF challenges, and finality checkpoints are
/// all indexed by window number rather than raw timestamps, so every
/// honest participant agrees on window boundaries without coordination.
pub fn current_timestamp() -> Timestamp {
    Utc::now().timestamp()
}

/// The window number containing `timestamp`.
pub fn window_of(timestamp: Timestamp) -> Window {
    (timestamp.max(0) as u64) / (FINALITY_INTERVAL_SECONDS as u64)
}

/// The current window, as of the system clock.
pub fn current_window() -> Window {
    window_of(current_timestamp())
}

/// The Unix timestamp at which `window` begins.
pub fn boundary_of(window: Window) -> Timestamp {
    (window as i64) * FINALITY_INTERVAL_SECONDS
}

/// Seconds remaining until the next window boundary, as of `timestamp`.
pub fn seconds_to_next_boundary(timestamp: Timestamp) -> i64 {
    let next = boundary_of(window_of(timestamp) + 1);
    next - timestamp
}

/// Validate that `timestamp` falls within `CLOCK_TOLERANCE_SECONDS` of
/// `now`, the verifier's own local UTC clock — not the claimed window's
/// boundary, which can be up to `FINALITY_INTERVAL_SECONDS` away and so
/// would admit far more skew than the spec's tolerance allows.
pub fn check_tolerance(timestamp: Timestamp, now: Timestamp) -> Result<(), TemporalError> {
    let delta = (timestamp - now).abs();
    if delta > CLOCK_TOLERANCE_SECONDS {
        return Err(TemporalError::ClockSkew { timestamp, now });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_boundaries_align() {
        assert_eq!(window_of(0), 0);
        assert_eq!(window_of(59), 0);
        assert_eq!(window_of(60), 1);
        assert_eq!(boundary_of(1), 60);
    }

    #[test]
    fn tolerance_accepts_within_bound_of_local_clock() {
        let now = 1_000_000;
        assert!(check_tolerance(now + CLOCK_TOLERANCE_SECONDS, now).is_ok());
        assert!(check_tolerance(now - CLOCK_TOLERANCE_SECONDS, now).is_ok());
        assert!(check_tolerance(now + CLOCK_TOLERANCE_SECONDS + 1, now).is_err());
        assert!(check_tolerance(now - CLOCK_TOLERANCE_SECONDS - 1, now).is_err());
    }
}
