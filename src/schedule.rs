use chrono::{DateTime, Duration, Utc};

use crate::models::Outcome;

// Interval growth is capped here regardless of outcome
pub const MAX_INTERVAL_DAYS: i64 = 90;

/// Next review interval in days, as a pure function of the previous interval
/// and the qualitative outcome.
///
/// Canonical steps for Remembered: 0 -> 1 -> 3 -> 7 -> 14 -> 30, then
/// doubling up to the 90-day cap. Kinda holds or regresses (never advances
/// past its bracket); Forgot always resets to 1. Off-step intervals (which
/// arise from halving) fall into the nearest bracket below.
pub fn next_interval(current: i64, outcome: Outcome) -> i64 {
    match outcome {
        Outcome::Forgot => 1,
        Outcome::Kinda => {
            if current <= 3 {
                1
            } else if current <= 7 {
                3
            } else {
                (current / 2).max(1)
            }
        }
        Outcome::Remembered => {
            if current <= 0 {
                1
            } else if current <= 1 {
                3
            } else if current <= 3 {
                7
            } else if current <= 7 {
                14
            } else if current <= 14 {
                30
            } else {
                (current * 2).min(MAX_INTERVAL_DAYS)
            }
        }
    }
}

// Due at the moment of computation plus the interval. No midnight rounding,
// no time-zone adjustment (the streak day key is the timezone-aware piece).
pub fn due_date(now: DateTime<Utc>, interval_days: i64) -> DateTime<Utc> {
    now + Duration::days(interval_days)
}
