use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Canonical YYYY-MM-DD key for an instant in the user's time zone. Streaks
/// and XP idempotency both bucket on this, never on the UTC date.
pub fn day_key(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%Y-%m-%d").to_string()
}

// ISO week key (e.g. "2024-W05") in the user's time zone, used to roll the
// weekly review counter.
pub fn week_key(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%G-W%V").to_string()
}

fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakUpdate {
    pub day_key: String,
    pub current: i64,
    pub longest: i64,
}

/// Decide the streak state after a qualifying activity at `now`.
///
/// Same calendar day as the last activity: no change. Exactly the next
/// calendar day: the streak continues. Any gap (or no prior activity): the
/// streak restarts at 1. Longest only ever ratchets up.
pub fn record_activity(
    last_day_key: Option<&str>,
    current: i64,
    longest: i64,
    now: DateTime<Utc>,
    tz: Tz,
) -> StreakUpdate {
    let today = day_key(now, tz);

    let new_current = match last_day_key.and_then(parse_day_key) {
        Some(last) => match parse_day_key(&today) {
            Some(today_date) => {
                let gap = (today_date - last).num_days();
                if gap == 0 {
                    return StreakUpdate {
                        day_key: today,
                        current,
                        longest: longest.max(current),
                    };
                } else if gap == 1 {
                    current + 1
                } else {
                    1
                }
            }
            None => 1,
        },
        None => 1,
    };

    StreakUpdate {
        day_key: today,
        current: new_current,
        longest: longest.max(new_current),
    }
}

/// Streak as it should be displayed right now, without writing anything: a
/// stored counter whose last activity is more than one calendar day ago has
/// lapsed and shows as 0 even though no activity event has reset it yet.
pub fn effective_streak(
    last_day_key: Option<&str>,
    current: i64,
    now: DateTime<Utc>,
    tz: Tz,
) -> i64 {
    let last = match last_day_key.and_then(parse_day_key) {
        Some(d) => d,
        None => return 0,
    };
    let today = match parse_day_key(&day_key(now, tz)) {
        Some(d) => d,
        None => return 0,
    };

    if (today - last).num_days() > 1 {
        0
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    const UTC_TZ: Tz = chrono_tz::UTC;

    #[test]
    fn day_key_uses_the_given_zone() {
        let instant = utc("2024-01-01T18:00:00Z");
        assert_eq!(day_key(instant, chrono_tz::UTC), "2024-01-01");
        assert_eq!(day_key(instant, chrono_tz::Asia::Tokyo), "2024-01-02");
        assert_eq!(
            day_key(instant, chrono_tz::America::Los_Angeles),
            "2024-01-01"
        );
    }

    #[test]
    fn same_utc_instant_differs_across_zones_twelve_hours_apart() {
        // The timezone-sensitivity property: one instant, two users, two days
        let instant = utc("2024-06-15T12:30:00Z");
        let auckland = day_key(instant, chrono_tz::Pacific::Auckland);
        let honolulu = day_key(instant, chrono_tz::Pacific::Honolulu);
        assert_eq!(auckland, "2024-06-16");
        assert_eq!(honolulu, "2024-06-15");
        assert_ne!(auckland, honolulu);
    }

    #[test]
    fn week_key_is_iso_week_in_zone() {
        assert_eq!(week_key(utc("2024-01-29T12:00:00Z"), UTC_TZ), "2024-W05");
        // Sunday 18:00 UTC is already Monday of the next ISO week in Tokyo
        let sunday_evening = utc("2024-02-04T18:00:00Z");
        assert_eq!(week_key(sunday_evening, UTC_TZ), "2024-W05");
        assert_eq!(week_key(sunday_evening, chrono_tz::Asia::Tokyo), "2024-W06");
    }

    #[test]
    fn consecutive_day_continues_streak() {
        let update = record_activity(
            Some("2024-01-01"),
            5,
            5,
            utc("2024-01-02T10:00:00Z"),
            UTC_TZ,
        );
        assert_eq!(update.current, 6);
        assert_eq!(update.longest, 6);
        assert_eq!(update.day_key, "2024-01-02");
    }

    #[test]
    fn same_day_is_a_no_op() {
        let update = record_activity(
            Some("2024-01-02"),
            6,
            6,
            utc("2024-01-02T23:00:00Z"),
            UTC_TZ,
        );
        assert_eq!(update.current, 6);
        assert_eq!(update.longest, 6);
        assert_eq!(update.day_key, "2024-01-02");
    }

    #[test]
    fn gap_resets_to_one() {
        let update = record_activity(
            Some("2024-01-02"),
            6,
            6,
            utc("2024-01-04T08:00:00Z"),
            UTC_TZ,
        );
        assert_eq!(update.current, 1);
        assert_eq!(update.longest, 6);
    }

    #[test]
    fn first_activity_starts_at_one() {
        let update = record_activity(None, 0, 0, utc("2024-01-01T08:00:00Z"), UTC_TZ);
        assert_eq!(update.current, 1);
        assert_eq!(update.longest, 1);
        assert_eq!(update.day_key, "2024-01-01");
    }

    #[test]
    fn longest_never_decreases() {
        let update = record_activity(
            Some("2024-01-01"),
            2,
            10,
            utc("2024-01-05T08:00:00Z"),
            UTC_TZ,
        );
        assert_eq!(update.current, 1);
        assert_eq!(update.longest, 10);
    }

    #[test]
    fn continuation_across_month_boundary() {
        let update = record_activity(
            Some("2024-01-31"),
            3,
            3,
            utc("2024-02-01T08:00:00Z"),
            UTC_TZ,
        );
        assert_eq!(update.current, 4);
    }

    #[test]
    fn zone_decides_whether_the_day_advanced() {
        // 18:00 UTC on Jan 1: next day already in Tokyo, same day in LA.
        let instant = utc("2024-01-01T18:00:00Z");
        let tokyo = record_activity(Some("2024-01-01"), 5, 5, instant, chrono_tz::Asia::Tokyo);
        let la = record_activity(
            Some("2024-01-01"),
            5,
            5,
            instant,
            chrono_tz::America::Los_Angeles,
        );
        assert_eq!(tokyo.current, 6);
        assert_eq!(la.current, 5);
    }

    #[test]
    fn effective_streak_shows_stored_value_when_fresh() {
        let now = utc("2024-01-02T08:00:00Z");
        assert_eq!(effective_streak(Some("2024-01-02"), 6, now, UTC_TZ), 6);
        assert_eq!(effective_streak(Some("2024-01-01"), 6, now, UTC_TZ), 6);
    }

    #[test]
    fn effective_streak_lapses_after_a_gap() {
        let now = utc("2024-01-04T08:00:00Z");
        assert_eq!(effective_streak(Some("2024-01-02"), 6, now, UTC_TZ), 0);
    }

    #[test]
    fn effective_streak_zero_when_never_active() {
        assert_eq!(effective_streak(None, 0, utc("2024-01-04T08:00:00Z"), UTC_TZ), 0);
    }
}
