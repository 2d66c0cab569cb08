use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};

use crate::models::{Difficulty, XpKind};

// Base XP for a completed review
pub fn review_amount(difficulty: Difficulty) -> i64 {
    match difficulty {
        Difficulty::Easy => 10,
        Difficulty::Medium => 25,
        Difficulty::Hard => 50,
    }
}

// Bonus XP when the completion came from the daily challenge
pub fn challenge_bonus(difficulty: Difficulty) -> i64 {
    match difficulty {
        Difficulty::Easy => 20,
        Difficulty::Medium => 50,
        Difficulty::Hard => 100,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub credited: bool,
    pub amount: i64,
}

/// Credit XP at most once per (user, problem, day_key, kind).
///
/// The check and the insert run on the caller's connection, so inside the
/// completion transaction they are atomic with everything else; the UNIQUE
/// index on the same tuple backs this up against concurrent writers. An
/// already-credited tuple is not an error: the caller gets
/// `credited = false, amount = 0` and must not count the XP again.
pub fn grant(
    conn: &Connection,
    user_id: &str,
    problem_id: Option<i64>,
    day_key: &str,
    kind: XpKind,
    amount: i64,
    now: DateTime<Utc>,
) -> Result<Grant> {
    let existing: Result<i64> = conn.query_row(
        r#"
        SELECT id FROM xp_ledger
        WHERE user_id = ?1 AND problem_id IS ?2 AND day_key = ?3 AND kind = ?4
        "#,
        params![user_id, problem_id, day_key, kind.as_str()],
        |row| row.get(0),
    );

    match existing {
        Ok(_) => Ok(Grant {
            credited: false,
            amount: 0,
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            append(conn, user_id, problem_id, day_key, kind, amount, now)?;
            Ok(Grant {
                credited: true,
                amount,
            })
        }
        Err(e) => Err(e),
    }
}

// Unchecked append, for achievement rewards: each achievement id can only
// unlock once ever, so the unlock set is the dedup boundary, not the tuple.
pub fn append(
    conn: &Connection,
    user_id: &str,
    problem_id: Option<i64>,
    day_key: &str,
    kind: XpKind,
    amount: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO xp_ledger (user_id, problem_id, kind, day_key, amount, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            user_id,
            problem_id,
            kind.as_str(),
            day_key,
            amount,
            now.to_rfc3339()
        ],
    )?;
    Ok(())
}
