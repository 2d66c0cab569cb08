use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};
use std::path::Path;

use crate::models::{
    Difficulty, Outcome, ReviewLogEntry, Source, TrackedProblem, UserStats, XpKind, XpLedgerEntry,
};

// The unique index on xp_ledger is the idempotency boundary for XP credits;
// it must hold at the storage layer, not just in application checks.
pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS problems (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    platform TEXT NOT NULL,
    slug TEXT NOT NULL,
    title TEXT,
    url TEXT,
    difficulty TEXT NOT NULL CHECK(difficulty IN ('easy', 'medium', 'hard')),
    interval_days INTEGER NOT NULL DEFAULT 0,
    review_count INTEGER NOT NULL DEFAULT 0,
    next_review_at TEXT NOT NULL,
    last_reviewed_at TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(user_id, platform, slug)
);

CREATE TABLE IF NOT EXISTS review_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    problem_id INTEGER NOT NULL,
    outcome TEXT NOT NULL CHECK(outcome IN ('remembered', 'kinda', 'forgot')),
    source TEXT NOT NULL CHECK(source IN ('web', 'extension', 'daily_challenge')),
    time_spent_ms INTEGER,
    interval_days INTEGER NOT NULL,
    xp_granted INTEGER NOT NULL,
    day_key TEXT NOT NULL,
    time_zone TEXT NOT NULL,
    reviewed_at TEXT NOT NULL,
    FOREIGN KEY (problem_id) REFERENCES problems(id)
);

CREATE TABLE IF NOT EXISTS xp_ledger (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    problem_id INTEGER,
    kind TEXT NOT NULL CHECK(kind IN ('review', 'daily_challenge', 'achievement')),
    day_key TEXT NOT NULL,
    amount INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_xp_ledger_dedup
    ON xp_ledger(user_id, problem_id, day_key, kind);

CREATE TABLE IF NOT EXISTS user_stats (
    user_id TEXT PRIMARY KEY,
    total_reviews INTEGER NOT NULL DEFAULT 0,
    total_xp INTEGER NOT NULL DEFAULT 0,
    current_streak INTEGER NOT NULL DEFAULT 0,
    longest_streak INTEGER NOT NULL DEFAULT 0,
    last_day_key TEXT,
    reviews_this_week INTEGER NOT NULL DEFAULT 0,
    week_key TEXT,
    friends_count INTEGER NOT NULL DEFAULT 0,
    last_reviewed_at TEXT
);

CREATE TABLE IF NOT EXISTS user_achievements (
    user_id TEXT NOT NULL,
    achievement_id TEXT NOT NULL,
    unlocked_at TEXT NOT NULL,
    PRIMARY KEY (user_id, achievement_id)
);

CREATE INDEX IF NOT EXISTS idx_problems_due ON problems(user_id, next_review_at);
CREATE INDEX IF NOT EXISTS idx_review_log_user ON review_log(user_id, day_key);
CREATE INDEX IF NOT EXISTS idx_review_log_problem ON review_log(problem_id);
CREATE INDEX IF NOT EXISTS idx_xp_ledger_user ON xp_ledger(user_id, day_key);
"#;

pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)
    }

    // Problem operations
    //
    // Creation seeds interval 0 / review_count 0 / due now; afterwards the
    // schedule fields belong to the completion engine.
    pub fn add_problem(
        &self,
        user_id: &str,
        platform: &str,
        slug: &str,
        title: Option<&str>,
        url: Option<&str>,
        difficulty: Difficulty,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO problems (user_id, platform, slug, title, url, difficulty,
                                  interval_days, review_count, next_review_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, ?7, ?7)
            "#,
            params![
                user_id,
                platform,
                slug,
                title,
                url,
                difficulty.as_str(),
                now.to_rfc3339()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_problem(&self, user_id: &str, id: i64) -> Result<Option<TrackedProblem>> {
        fetch_problem(&self.conn, user_id, id)
    }

    pub fn list_problems(
        &self,
        user_id: &str,
        due_only: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<TrackedProblem>> {
        let (query, params_vec): (String, Vec<Box<dyn rusqlite::ToSql>>) = if due_only {
            (
                format!(
                    "{} WHERE user_id = ?1 AND next_review_at <= ?2 ORDER BY next_review_at ASC",
                    PROBLEM_SELECT
                ),
                vec![Box::new(user_id.to_string()), Box::new(now.to_rfc3339())],
            )
        } else {
            (
                format!(
                    "{} WHERE user_id = ?1 ORDER BY next_review_at ASC",
                    PROBLEM_SELECT
                ),
                vec![Box::new(user_id.to_string())],
            )
        };

        let mut stmt = self.conn.prepare(&query)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|b| b.as_ref()).collect();

        let rows = stmt.query_map(params_refs.as_slice(), row_to_problem)?;
        rows.collect()
    }

    pub fn delete_problem(&self, user_id: &str, id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM problems WHERE user_id = ?1 AND id = ?2",
            params![user_id, id],
        )?;
        Ok(rows > 0)
    }

    // Weighted random pick among due problems: more overdue = more likely.
    pub fn next_due_problem(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<TrackedProblem>> {
        let due = self.list_problems(user_id, true, now)?;
        if due.is_empty() {
            return Ok(None);
        }

        use rand::Rng;
        let mut rng = rand::thread_rng();

        let weights: Vec<f64> = due
            .iter()
            .map(|p| {
                let overdue_days = DateTime::parse_from_rfc3339(&p.next_review_at)
                    .map(|next| {
                        let diff = now.signed_duration_since(next.with_timezone(&Utc));
                        diff.num_days().max(0) as f64
                    })
                    .unwrap_or(0.0);
                overdue_days + 1.0
            })
            .collect();

        let total_weight: f64 = weights.iter().sum();
        let mut random_point = rng.gen::<f64>() * total_weight;

        for (i, weight) in weights.iter().enumerate() {
            random_point -= weight;
            if random_point <= 0.0 {
                return Ok(Some(due[i].clone()));
            }
        }

        // Fallback to first
        Ok(due.into_iter().next())
    }

    // Aggregate operations
    pub fn get_user_stats(&self, user_id: &str) -> Result<Option<UserStats>> {
        fetch_user_stats(&self.conn, user_id)
    }

    pub fn unlocked_achievements(&self, user_id: &str) -> Result<Vec<String>> {
        fetch_unlocked(&self.conn, user_id)
    }

    pub fn problems_tracked(&self, user_id: &str) -> Result<i64> {
        count_problems(&self.conn, user_id)
    }

    // Collaborator interface: the social layer owns this counter, the engine
    // only reads it into the achievement snapshot.
    pub fn set_friends_count(&self, user_id: &str, count: i64) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO user_stats (user_id, friends_count) VALUES (?1, ?2)
            ON CONFLICT(user_id) DO UPDATE SET friends_count = ?2
            "#,
            params![user_id, count],
        )?;
        Ok(())
    }

    pub fn review_history(
        &self,
        user_id: &str,
        problem_id: Option<i64>,
    ) -> Result<Vec<ReviewLogEntry>> {
        let (query, params_vec): (String, Vec<Box<dyn rusqlite::ToSql>>) = if let Some(pid) =
            problem_id
        {
            (
                format!(
                    "{} WHERE user_id = ?1 AND problem_id = ?2 ORDER BY reviewed_at DESC",
                    REVIEW_LOG_SELECT
                ),
                vec![Box::new(user_id.to_string()), Box::new(pid)],
            )
        } else {
            (
                format!(
                    "{} WHERE user_id = ?1 ORDER BY reviewed_at DESC",
                    REVIEW_LOG_SELECT
                ),
                vec![Box::new(user_id.to_string())],
            )
        };

        let mut stmt = self.conn.prepare(&query)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|b| b.as_ref()).collect();

        let rows = stmt.query_map(params_refs.as_slice(), row_to_review_log)?;
        rows.collect()
    }

    pub fn xp_entries(&self, user_id: &str) -> Result<Vec<XpLedgerEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, problem_id, kind, day_key, amount, created_at
            FROM xp_ledger
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            let kind_str: String = row.get(3)?;
            Ok(XpLedgerEntry {
                id: row.get(0)?,
                user_id: row.get(1)?,
                problem_id: row.get(2)?,
                kind: XpKind::from_str(&kind_str).unwrap_or(XpKind::Review),
                day_key: row.get(4)?,
                amount: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;
        rows.collect()
    }

    pub fn get_summary(&self, user_id: &str, now: DateTime<Utc>) -> Result<Summary> {
        let problems_tracked = count_problems(&self.conn, user_id)?;

        let due_now: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM problems WHERE user_id = ?1 AND next_review_at <= ?2",
            params![user_id, now.to_rfc3339()],
            |row| row.get(0),
        )?;

        let stats =
            fetch_user_stats(&self.conn, user_id)?.unwrap_or_else(|| UserStats::new(user_id));
        let achievements_unlocked = fetch_unlocked(&self.conn, user_id)?.len() as i64;

        Ok(Summary {
            problems_tracked,
            due_now,
            achievements_unlocked,
            stats,
        })
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Summary {
    pub problems_tracked: i64,
    pub due_now: i64,
    pub achievements_unlocked: i64,
    pub stats: UserStats,
}

const PROBLEM_SELECT: &str = r#"
    SELECT id, user_id, platform, slug, title, url, difficulty,
           interval_days, review_count, next_review_at, last_reviewed_at, created_at
    FROM problems
"#;

const REVIEW_LOG_SELECT: &str = r#"
    SELECT id, user_id, problem_id, outcome, source, time_spent_ms,
           interval_days, xp_granted, day_key, time_zone, reviewed_at
    FROM review_log
"#;

fn row_to_problem(row: &rusqlite::Row) -> Result<TrackedProblem> {
    let difficulty_str: String = row.get(6)?;
    Ok(TrackedProblem {
        id: row.get(0)?,
        user_id: row.get(1)?,
        platform: row.get(2)?,
        slug: row.get(3)?,
        title: row.get(4)?,
        url: row.get(5)?,
        difficulty: Difficulty::from_str(&difficulty_str).unwrap_or(Difficulty::Medium),
        interval_days: row.get(7)?,
        review_count: row.get(8)?,
        next_review_at: row.get(9)?,
        last_reviewed_at: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn row_to_review_log(row: &rusqlite::Row) -> Result<ReviewLogEntry> {
    let outcome_str: String = row.get(3)?;
    let source_str: String = row.get(4)?;
    Ok(ReviewLogEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        problem_id: row.get(2)?,
        outcome: Outcome::from_str(&outcome_str).unwrap_or(Outcome::Kinda),
        source: Source::from_str(&source_str).unwrap_or(Source::Web),
        time_spent_ms: row.get(5)?,
        interval_days: row.get(6)?,
        xp_granted: row.get(7)?,
        day_key: row.get(8)?,
        time_zone: row.get(9)?,
        reviewed_at: row.get(10)?,
    })
}

// Row readers shared with the engine, which runs them against its own
// transaction (Transaction derefs to Connection).
pub(crate) fn fetch_problem(
    conn: &Connection,
    user_id: &str,
    id: i64,
) -> Result<Option<TrackedProblem>> {
    let query = format!("{} WHERE user_id = ?1 AND id = ?2", PROBLEM_SELECT);
    let mut stmt = conn.prepare(&query)?;

    let problem = stmt.query_row(params![user_id, id], row_to_problem);
    match problem {
        Ok(p) => Ok(Some(p)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

pub(crate) fn fetch_user_stats(conn: &Connection, user_id: &str) -> Result<Option<UserStats>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT user_id, total_reviews, total_xp, current_streak, longest_streak,
               last_day_key, reviews_this_week, week_key, friends_count, last_reviewed_at
        FROM user_stats
        WHERE user_id = ?1
        "#,
    )?;

    let stats = stmt.query_row(params![user_id], |row| {
        Ok(UserStats {
            user_id: row.get(0)?,
            total_reviews: row.get(1)?,
            total_xp: row.get(2)?,
            current_streak: row.get(3)?,
            longest_streak: row.get(4)?,
            last_day_key: row.get(5)?,
            reviews_this_week: row.get(6)?,
            week_key: row.get(7)?,
            friends_count: row.get(8)?,
            last_reviewed_at: row.get(9)?,
        })
    });

    match stats {
        Ok(s) => Ok(Some(s)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

pub(crate) fn fetch_unlocked(conn: &Connection, user_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT achievement_id FROM user_achievements WHERE user_id = ?1 ORDER BY unlocked_at ASC",
    )?;
    let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
    rows.collect()
}

pub(crate) fn count_problems(conn: &Connection, user_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM problems WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )
}
