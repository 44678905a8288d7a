use std::collections::VecDeque;

use kronos_core::constants::{
    INFLUX_SAFEGUARD_MULTIPLE, INFLUX_SAFEGUARD_MULTIPLIER, INFLUX_SAFEGUARD_TRAILING_WINDOWS,
    INFLUX_SAFEGUARD_UNDER_DAYS,
};
use kronos_core::types::Timestamp;

/// Tracks new-participant registration counts per finality window to detect
/// a sudden influx that could otherwise let a burst of freshly registered,
/// low-reputation participants dominate a slot lottery before their
/// probation has meaningfully ramped.
#[derive(Debug, Default)]
pub struct RegistrationLog {
    /// Registration counts for the most recent windows, oldest first.
    trailing_counts: VecDeque<u64>,
    current_window: Option<u64>,
    current_count: u64,
}

impl RegistrationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one registration observed in `window`.
    pub fn record(&mut self, window: u64) {
        self.roll_to(window);
        self.current_count += 1;
    }

    fn roll_to(&mut self, window: u64) {
        match self.current_window {
            Some(w) if w == window => {}
            Some(w) if window > w => {
                self.trailing_counts.push_back(self.current_count);
                while self.trailing_counts.len() > INFLUX_SAFEGUARD_TRAILING_WINDOWS {
                    self.trailing_counts.pop_front();
                }
                self.current_window = Some(window);
                self.current_count = 0;
            }
            _ => {
                self.current_window = Some(window);
                self.current_count = 0;
            }
        }
    }

    fn trailing_median(&self) -> f64 {
        if self.trailing_counts.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<u64> = self.trailing_counts.iter().copied().collect();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
        } else {
            sorted[mid] as f64
        }
    }

    /// Whether `window`'s registration count exceeds the safeguard multiple
    /// of the trailing median, for a participant registered less than
    /// `INFLUX_SAFEGUARD_UNDER_DAYS` days ago at `registered_at`.
    pub fn influx_detected(&self, window: u64, registered_at: Timestamp, now: Timestamp) -> bool {
        let age_days = (now - registered_at) / 86_400;
        if age_days >= INFLUX_SAFEGUARD_UNDER_DAYS {
            return false;
        }
        let current = if self.current_window == Some(window) {
            self.current_count as f64
        } else {
            0.0
        };
        let median = self.trailing_median();
        median > 0.0 && current > median * INFLUX_SAFEGUARD_MULTIPLE
    }

    /// The extra probation multiplier to apply on top of the normal ramp
    /// when an influx is in effect.
    pub fn safeguard_multiplier(&self) -> f64 {
        INFLUX_SAFEGUARD_MULTIPLIER
    }
}
