//! Review completion: the one operation that advances a problem's schedule,
//! credits XP, maintains the streak, and unlocks achievements as a single
//! unit of work.
//!
//! Everything runs inside one SQLite transaction. A retry after a timeout is
//! safe: the XP ledger's (user, problem, day, kind) dedup makes the second
//! attempt credit nothing while the schedule still advances.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rusqlite::params;
use thiserror::Error;

use crate::achievements::{self, AchievementContext};
use crate::db::{self, Database};
use crate::models::{Outcome, Source, TrackedProblem, UserStats, XpKind};
use crate::schedule;
use crate::streak;
use crate::xp;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The problem does not exist or is not owned by the caller.
    #[error("problem not found")]
    NotFound,

    /// Rejected before any storage access.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Opaque storage failure; the transaction rolled back and the request
    /// is safe to retry verbatim.
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

#[derive(Debug, Clone)]
pub struct CompleteReviewRequest<'a> {
    pub user_id: &'a str,
    pub problem_id: i64,
    pub outcome: Outcome,
    pub source: Source,
    pub time_spent_ms: Option<i64>,
    /// IANA zone name; the transport defaults this to "UTC" when absent.
    pub time_zone: &'a str,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ReviewCompletion {
    pub problem: TrackedProblem,
    pub xp_earned: i64,
    pub new_achievements: Vec<String>,
}

impl Database {
    /// Complete one review. All-or-nothing: on any error the schedule
    /// update, log entry, ledger rows, aggregate changes, and unlocks are
    /// rolled back together.
    pub fn complete_review(
        &mut self,
        req: &CompleteReviewRequest,
    ) -> Result<ReviewCompletion, EngineError> {
        let tz: Tz = req
            .time_zone
            .parse()
            .map_err(|_| EngineError::InvalidInput(format!("unknown time zone '{}'", req.time_zone)))?;

        let tx = self.conn.transaction()?;

        let mut problem =
            db::fetch_problem(&tx, req.user_id, req.problem_id)?.ok_or(EngineError::NotFound)?;

        let today = streak::day_key(req.now, tz);
        let now_str = req.now.to_rfc3339();
        let mut xp_earned = 0i64;

        // Base XP, deduplicated per problem per local day. Schedule and log
        // are not gated on this: a repeat completion still advances.
        let base = xp::grant(
            &tx,
            req.user_id,
            Some(problem.id),
            &today,
            XpKind::Review,
            xp::review_amount(problem.difficulty),
            req.now,
        )?;
        xp_earned += base.amount;

        if req.source == Source::DailyChallenge {
            let bonus = xp::grant(
                &tx,
                req.user_id,
                Some(problem.id),
                &today,
                XpKind::DailyChallenge,
                xp::challenge_bonus(problem.difficulty),
                req.now,
            )?;
            xp_earned += bonus.amount;
        }

        // Advance the schedule
        let next_interval = schedule::next_interval(problem.interval_days, req.outcome);
        let due = schedule::due_date(req.now, next_interval);
        tx.execute(
            r#"
            UPDATE problems
            SET interval_days = ?1,
                review_count = review_count + 1,
                next_review_at = ?2,
                last_reviewed_at = ?3
            WHERE id = ?4
            "#,
            params![next_interval, due.to_rfc3339(), now_str, problem.id],
        )?;
        problem.interval_days = next_interval;
        problem.review_count += 1;
        problem.next_review_at = due.to_rfc3339();
        problem.last_reviewed_at = Some(now_str.clone());

        // Immutable history row; xp_granted is the XP for the review itself
        // (base + challenge bonus), before any achievement rewards.
        tx.execute(
            r#"
            INSERT INTO review_log (user_id, problem_id, outcome, source, time_spent_ms,
                                    interval_days, xp_granted, day_key, time_zone, reviewed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                req.user_id,
                problem.id,
                req.outcome.as_str(),
                req.source.as_str(),
                req.time_spent_ms,
                next_interval,
                xp_earned,
                today,
                req.time_zone,
                now_str
            ],
        )?;

        // Streak + aggregate
        let stats =
            db::fetch_user_stats(&tx, req.user_id)?.unwrap_or_else(|| UserStats::new(req.user_id));
        let update = streak::record_activity(
            stats.last_day_key.as_deref(),
            stats.current_streak,
            stats.longest_streak,
            req.now,
            tz,
        );
        let this_week = streak::week_key(req.now, tz);
        let reviews_this_week = if stats.week_key.as_deref() == Some(this_week.as_str()) {
            stats.reviews_this_week + 1
        } else {
            1
        };
        let total_reviews = stats.total_reviews + 1;

        tx.execute(
            r#"
            INSERT INTO user_stats (user_id, total_reviews, current_streak, longest_streak,
                                    last_day_key, reviews_this_week, week_key, last_reviewed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(user_id) DO UPDATE SET
                total_reviews = ?2,
                current_streak = ?3,
                longest_streak = ?4,
                last_day_key = ?5,
                reviews_this_week = ?6,
                week_key = ?7,
                last_reviewed_at = ?8
            "#,
            params![
                req.user_id,
                total_reviews,
                update.current,
                update.longest,
                update.day_key,
                reviews_this_week,
                this_week,
                now_str
            ],
        )?;

        // Achievements from the just-updated aggregate
        let unlocked: HashSet<String> = db::fetch_unlocked(&tx, req.user_id)?.into_iter().collect();
        let ctx = AchievementContext {
            total_reviews,
            current_streak: update.current,
            longest_streak: update.longest,
            problems_tracked: db::count_problems(&tx, req.user_id)?,
            friends_count: stats.friends_count,
        };

        let mut new_achievements = Vec::new();
        for def in achievements::evaluate(&ctx, &unlocked) {
            tx.execute(
                "INSERT INTO user_achievements (user_id, achievement_id, unlocked_at) VALUES (?1, ?2, ?3)",
                params![req.user_id, def.id, now_str],
            )?;
            xp::append(
                &tx,
                req.user_id,
                None,
                &today,
                XpKind::Achievement,
                def.xp_reward,
                req.now,
            )?;
            xp_earned += def.xp_reward;
            new_achievements.push(def.id.to_string());
        }

        tx.execute(
            "UPDATE user_stats SET total_xp = total_xp + ?1 WHERE user_id = ?2",
            params![xp_earned, req.user_id],
        )?;

        tx.commit()?;

        Ok(ReviewCompletion {
            problem,
            xp_earned,
            new_achievements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::{FIRST_REVIEW, FRIENDS_1, STREAK_3};
    use crate::models::Difficulty;

    fn setup_db() -> Database {
        let db = Database::open(":memory:").expect("Failed to create in-memory database");
        db.init().expect("Failed to initialize database");
        db
    }

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn add_problem(db: &Database, slug: &str, difficulty: Difficulty, now: DateTime<Utc>) -> i64 {
        db.add_problem("alice", "leetcode", slug, None, None, difficulty, now)
            .unwrap()
    }

    fn request<'a>(
        problem_id: i64,
        outcome: Outcome,
        source: Source,
        now: DateTime<Utc>,
    ) -> CompleteReviewRequest<'a> {
        CompleteReviewRequest {
            user_id: "alice",
            problem_id,
            outcome,
            source,
            time_spent_ms: None,
            time_zone: "UTC",
            now,
        }
    }

    fn ledger_rows(db: &Database, kind: &str) -> i64 {
        db.conn
            .query_row(
                "SELECT COUNT(*) FROM xp_ledger WHERE kind = ?1",
                params![kind],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn first_completion_credits_grants_and_advances() {
        let mut db = setup_db();
        let now = utc("2024-01-01T12:00:00Z");
        let id = add_problem(&db, "two-sum", Difficulty::Medium, now);

        let result = db
            .complete_review(&request(id, Outcome::Remembered, Source::Web, now))
            .unwrap();

        // 25 base (medium) + 25 first_review achievement
        assert_eq!(result.xp_earned, 50);
        assert_eq!(result.new_achievements, vec![FIRST_REVIEW.to_string()]);
        assert_eq!(result.problem.interval_days, 1);
        assert_eq!(result.problem.review_count, 1);
        assert_eq!(
            result.problem.next_review_at,
            utc("2024-01-02T12:00:00Z").to_rfc3339()
        );

        let stats = db.get_user_stats("alice").unwrap().unwrap();
        assert_eq!(stats.total_reviews, 1);
        assert_eq!(stats.total_xp, 50);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 1);
        assert_eq!(stats.reviews_this_week, 1);
        assert_eq!(stats.last_day_key.as_deref(), Some("2024-01-01"));

        let log = db.review_history("alice", Some(id)).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].outcome, Outcome::Remembered);
        assert_eq!(log[0].interval_days, 1);
        // Log captures the review XP only, not the achievement reward
        assert_eq!(log[0].xp_granted, 25);
        assert_eq!(log[0].day_key, "2024-01-01");
        assert_eq!(log[0].time_zone, "UTC");
    }

    #[test]
    fn same_day_retry_credits_no_review_xp_but_still_advances() {
        let mut db = setup_db();
        let now = utc("2024-01-01T12:00:00Z");
        let id = add_problem(&db, "two-sum", Difficulty::Medium, now);

        let first = db
            .complete_review(&request(id, Outcome::Remembered, Source::Web, now))
            .unwrap();
        let retry_at = utc("2024-01-01T12:05:00Z");
        let second = db
            .complete_review(&request(id, Outcome::Remembered, Source::Web, retry_at))
            .unwrap();

        assert_eq!(first.xp_earned, 50);
        assert_eq!(second.xp_earned, 0);

        // Exactly one review-kind ledger row for the day
        assert_eq!(ledger_rows(&db, "review"), 1);

        // Scheduling is independently non-idempotent: both calls advance
        let problem = db.get_problem("alice", id).unwrap().unwrap();
        assert_eq!(problem.review_count, 2);
        assert_eq!(problem.interval_days, 3);

        // Both attempts are logged regardless of XP outcome
        assert_eq!(db.review_history("alice", Some(id)).unwrap().len(), 2);

        // Second same-day activity does not touch the streak
        let stats = db.get_user_stats("alice").unwrap().unwrap();
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.total_reviews, 2);
    }

    #[test]
    fn review_count_is_monotonic_across_outcomes() {
        let mut db = setup_db();
        let mut now = utc("2024-01-01T12:00:00Z");
        let id = add_problem(&db, "two-sum", Difficulty::Easy, now);

        let outcomes = [
            Outcome::Remembered,
            Outcome::Forgot,
            Outcome::Kinda,
            Outcome::Remembered,
            Outcome::Forgot,
        ];
        for outcome in outcomes {
            db.complete_review(&request(id, outcome, Source::Web, now))
                .unwrap();
            now = now + chrono::Duration::days(1);
        }

        let problem = db.get_problem("alice", id).unwrap().unwrap();
        assert_eq!(problem.review_count, outcomes.len() as i64);
    }

    #[test]
    fn interval_caps_at_ninety_under_repeated_success() {
        let mut db = setup_db();
        let mut now = utc("2024-01-01T12:00:00Z");
        let id = add_problem(&db, "two-sum", Difficulty::Easy, now);

        // Walk the problem up to interval 14 first
        for _ in 0..4 {
            db.complete_review(&request(id, Outcome::Remembered, Source::Web, now))
                .unwrap();
            now = now + chrono::Duration::days(1);
        }
        assert_eq!(
            db.get_problem("alice", id).unwrap().unwrap().interval_days,
            14
        );

        let mut seen = Vec::new();
        for _ in 0..5 {
            let result = db
                .complete_review(&request(id, Outcome::Remembered, Source::Web, now))
                .unwrap();
            seen.push(result.problem.interval_days);
            now = now + chrono::Duration::days(1);
        }
        assert_eq!(seen, vec![30, 60, 90, 90, 90]);
    }

    #[test]
    fn forgot_resets_interval_from_anywhere() {
        let mut db = setup_db();
        let mut now = utc("2024-01-01T12:00:00Z");
        let id = add_problem(&db, "two-sum", Difficulty::Easy, now);

        for _ in 0..6 {
            db.complete_review(&request(id, Outcome::Remembered, Source::Web, now))
                .unwrap();
            now = now + chrono::Duration::days(1);
        }
        assert!(db.get_problem("alice", id).unwrap().unwrap().interval_days > 14);

        let result = db
            .complete_review(&request(id, Outcome::Forgot, Source::Web, now))
            .unwrap();
        assert_eq!(result.problem.interval_days, 1);
    }

    #[test]
    fn daily_challenge_bonus_is_independent_of_review_xp() {
        let mut db = setup_db();
        let now = utc("2024-01-01T12:00:00Z");
        let id = add_problem(&db, "two-sum", Difficulty::Hard, now);

        // Regular review first: credits review XP (50 hard) + first_review
        let first = db
            .complete_review(&request(id, Outcome::Remembered, Source::Web, now))
            .unwrap();
        assert_eq!(first.xp_earned, 50 + 25);

        // Same-day daily challenge: review XP already credited, bonus is not
        let second = db
            .complete_review(&request(
                id,
                Outcome::Remembered,
                Source::DailyChallenge,
                utc("2024-01-01T13:00:00Z"),
            ))
            .unwrap();
        assert_eq!(second.xp_earned, 100);
        assert_eq!(ledger_rows(&db, "review"), 1);
        assert_eq!(ledger_rows(&db, "daily_challenge"), 1);

        // A second same-day challenge credits neither
        let third = db
            .complete_review(&request(
                id,
                Outcome::Remembered,
                Source::DailyChallenge,
                utc("2024-01-01T14:00:00Z"),
            ))
            .unwrap();
        assert_eq!(third.xp_earned, 0);
        assert_eq!(ledger_rows(&db, "daily_challenge"), 1);
    }

    #[test]
    fn streak_builds_across_days_and_unlocks_streak_achievement() {
        let mut db = setup_db();
        let id = add_problem(&db, "two-sum", Difficulty::Easy, utc("2024-01-01T12:00:00Z"));

        let mut unlocked_on_day3 = Vec::new();
        for day in 1..=3 {
            let now = utc(&format!("2024-01-0{}T12:00:00Z", day));
            let result = db
                .complete_review(&request(id, Outcome::Remembered, Source::Web, now))
                .unwrap();
            if day == 3 {
                unlocked_on_day3 = result.new_achievements;
            }
        }

        let stats = db.get_user_stats("alice").unwrap().unwrap();
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);
        assert!(unlocked_on_day3.contains(&STREAK_3.to_string()));
    }

    #[test]
    fn streak_resets_after_gap_but_longest_survives() {
        let mut db = setup_db();
        let id = add_problem(&db, "two-sum", Difficulty::Easy, utc("2024-01-01T12:00:00Z"));

        for day in 1..=3 {
            let now = utc(&format!("2024-01-0{}T12:00:00Z", day));
            db.complete_review(&request(id, Outcome::Remembered, Source::Web, now))
                .unwrap();
        }
        // Two-day gap
        db.complete_review(&request(
            id,
            Outcome::Remembered,
            Source::Web,
            utc("2024-01-06T12:00:00Z"),
        ))
        .unwrap();

        let stats = db.get_user_stats("alice").unwrap().unwrap();
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 3);
    }

    #[test]
    fn achievements_are_never_removed() {
        let mut db = setup_db();
        let id = add_problem(&db, "two-sum", Difficulty::Easy, utc("2024-01-01T12:00:00Z"));

        for day in 1..=3 {
            let now = utc(&format!("2024-01-0{}T12:00:00Z", day));
            db.complete_review(&request(id, Outcome::Remembered, Source::Web, now))
                .unwrap();
        }
        let before = db.unlocked_achievements("alice").unwrap();
        assert!(before.contains(&STREAK_3.to_string()));

        // Streak lapses and restarts at 1; the unlock set only grows
        db.complete_review(&request(
            id,
            Outcome::Forgot,
            Source::Web,
            utc("2024-01-10T12:00:00Z"),
        ))
        .unwrap();

        let after = db.unlocked_achievements("alice").unwrap();
        for id in &before {
            assert!(after.contains(id), "achievement {} disappeared", id);
        }
    }

    #[test]
    fn friend_count_feeds_achievement_snapshot() {
        let mut db = setup_db();
        let now = utc("2024-01-01T12:00:00Z");
        let id = add_problem(&db, "two-sum", Difficulty::Easy, now);
        db.set_friends_count("alice", 2).unwrap();

        let result = db
            .complete_review(&request(id, Outcome::Remembered, Source::Web, now))
            .unwrap();
        assert!(result.new_achievements.contains(&FRIENDS_1.to_string()));
    }

    #[test]
    fn not_found_for_missing_or_foreign_problem() {
        let mut db = setup_db();
        let now = utc("2024-01-01T12:00:00Z");
        let id = db
            .add_problem("bob", "leetcode", "two-sum", None, None, Difficulty::Easy, now)
            .unwrap();

        let missing = db.complete_review(&request(999, Outcome::Remembered, Source::Web, now));
        assert!(matches!(missing, Err(EngineError::NotFound)));

        // Owned by bob, requested as alice
        let foreign = db.complete_review(&request(id, Outcome::Remembered, Source::Web, now));
        assert!(matches!(foreign, Err(EngineError::NotFound)));

        // Client error leaves no partial effect
        assert_eq!(db.review_history("alice", None).unwrap().len(), 0);
        assert!(db.get_user_stats("alice").unwrap().is_none());
    }

    #[test]
    fn invalid_time_zone_is_rejected_before_storage() {
        let mut db = setup_db();
        let now = utc("2024-01-01T12:00:00Z");
        let id = add_problem(&db, "two-sum", Difficulty::Easy, now);

        let mut req = request(id, Outcome::Remembered, Source::Web, now);
        req.time_zone = "Mars/Olympus_Mons";
        let result = db.complete_review(&req);
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));

        let problem = db.get_problem("alice", id).unwrap().unwrap();
        assert_eq!(problem.review_count, 0);
    }

    #[test]
    fn injected_failure_rolls_back_everything() {
        let mut db = setup_db();
        let now = utc("2024-01-01T12:00:00Z");
        let id = add_problem(&db, "two-sum", Difficulty::Medium, now);

        // Force the achievement-reward step to fail: the first completion
        // unlocks first_review, whose ledger insert this trigger aborts.
        db.conn
            .execute_batch(
                r#"
                CREATE TRIGGER abort_achievement_credit BEFORE INSERT ON xp_ledger
                WHEN NEW.kind = 'achievement'
                BEGIN
                    SELECT RAISE(ABORT, 'injected failure');
                END;
                "#,
            )
            .unwrap();

        let result = db.complete_review(&request(id, Outcome::Remembered, Source::Web, now));
        assert!(matches!(result, Err(EngineError::Storage(_))));

        // Nothing from the aborted call is visible
        let problem = db.get_problem("alice", id).unwrap().unwrap();
        assert_eq!(problem.review_count, 0);
        assert_eq!(problem.interval_days, 0);
        assert!(problem.last_reviewed_at.is_none());
        assert!(db.review_history("alice", None).unwrap().is_empty());
        assert!(db.xp_entries("alice").unwrap().is_empty());
        assert!(db.get_user_stats("alice").unwrap().is_none());
        assert!(db.unlocked_achievements("alice").unwrap().is_empty());
    }

    #[test]
    fn same_instant_different_zones_produce_different_day_keys() {
        let mut db = setup_db();
        let instant = utc("2024-01-01T18:00:00Z");
        let id_alice = add_problem(&db, "two-sum", Difficulty::Easy, instant);
        let id_bob = db
            .add_problem("bob", "leetcode", "two-sum", None, None, Difficulty::Easy, instant)
            .unwrap();

        // Both reviewed yesterday in their own zones
        let mut alice_req = request(id_alice, Outcome::Remembered, Source::Web, instant);
        alice_req.time_zone = "Asia/Tokyo";
        let mut bob_req = CompleteReviewRequest {
            user_id: "bob",
            problem_id: id_bob,
            outcome: Outcome::Remembered,
            source: Source::Web,
            time_spent_ms: None,
            time_zone: "America/Los_Angeles",
            now: instant,
        };
        db.complete_review(&alice_req).unwrap();
        db.complete_review(&bob_req).unwrap();

        let alice = db.get_user_stats("alice").unwrap().unwrap();
        let bob = db.get_user_stats("bob").unwrap().unwrap();
        // 18:00 UTC is Jan 2 in Tokyo, Jan 1 in Los Angeles
        assert_eq!(alice.last_day_key.as_deref(), Some("2024-01-02"));
        assert_eq!(bob.last_day_key.as_deref(), Some("2024-01-01"));

        // 05:00 UTC on Jan 2 is Jan 2 14:00 in Tokyo and Jan 1 21:00 in LA:
        // a same-day no-op in both zones.
        let next = utc("2024-01-02T05:00:00Z");
        alice_req.now = next;
        bob_req.now = next;
        db.complete_review(&alice_req).unwrap();
        db.complete_review(&bob_req).unwrap();

        let alice = db.get_user_stats("alice").unwrap().unwrap();
        let bob = db.get_user_stats("bob").unwrap().unwrap();
        // Same day in both zones: neither streak moved
        assert_eq!(alice.current_streak, 1);
        assert_eq!(bob.current_streak, 1);

        // 13:00 UTC on Jan 2: Jan 2 everywhere relevant -> Tokyo no-op,
        // LA advances to Jan 2 and continues the streak.
        let later = utc("2024-01-02T13:00:00Z");
        alice_req.now = later;
        bob_req.now = later;
        db.complete_review(&alice_req).unwrap();
        db.complete_review(&bob_req).unwrap();

        let alice = db.get_user_stats("alice").unwrap().unwrap();
        let bob = db.get_user_stats("bob").unwrap().unwrap();
        assert_eq!(alice.current_streak, 1, "Tokyo already counted Jan 2");
        assert_eq!(bob.current_streak, 2, "LA crossed into Jan 2");
    }

    #[test]
    fn week_counter_resets_on_new_iso_week() {
        let mut db = setup_db();
        let id = add_problem(&db, "two-sum", Difficulty::Easy, utc("2024-01-05T12:00:00Z"));

        // Friday and Saturday of ISO week 1
        db.complete_review(&request(
            id,
            Outcome::Remembered,
            Source::Web,
            utc("2024-01-05T12:00:00Z"),
        ))
        .unwrap();
        db.complete_review(&request(
            id,
            Outcome::Remembered,
            Source::Web,
            utc("2024-01-06T12:00:00Z"),
        ))
        .unwrap();
        assert_eq!(
            db.get_user_stats("alice").unwrap().unwrap().reviews_this_week,
            2
        );

        // Monday of ISO week 2
        db.complete_review(&request(
            id,
            Outcome::Remembered,
            Source::Web,
            utc("2024-01-08T12:00:00Z"),
        ))
        .unwrap();
        assert_eq!(
            db.get_user_stats("alice").unwrap().unwrap().reviews_this_week,
            1
        );
    }

    #[test]
    fn xp_balance_accumulates_across_days() {
        let mut db = setup_db();
        let id = add_problem(&db, "two-sum", Difficulty::Easy, utc("2024-01-01T12:00:00Z"));

        // Day 1: 10 base + 25 first_review; day 2: 10 base
        db.complete_review(&request(
            id,
            Outcome::Remembered,
            Source::Web,
            utc("2024-01-01T12:00:00Z"),
        ))
        .unwrap();
        db.complete_review(&request(
            id,
            Outcome::Remembered,
            Source::Web,
            utc("2024-01-02T12:00:00Z"),
        ))
        .unwrap();

        let stats = db.get_user_stats("alice").unwrap().unwrap();
        assert_eq!(stats.total_xp, 10 + 25 + 10);

        // Ledger sums to the same balance
        let ledger_total: i64 = db
            .conn
            .query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM xp_ledger WHERE user_id = 'alice'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(ledger_total, stats.total_xp);
    }
}
