use serde::{Deserialize, Serialize};

// Problem difficulty as reported by the practice platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" | "e" => Some(Difficulty::Easy),
            "medium" | "m" => Some(Difficulty::Medium),
            "hard" | "h" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

// Qualitative result of a review attempt, driving the interval adjustment.
// The 1-5 numeric rating used by clients maps onto these three buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Remembered,
    Kinda,
    Forgot,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Remembered => "remembered",
            Outcome::Kinda => "kinda",
            Outcome::Forgot => "forgot",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "remembered" | "r" | "good" | "4" | "5" => Some(Outcome::Remembered),
            "kinda" | "k" | "partial" | "3" => Some(Outcome::Kinda),
            "forgot" | "f" | "fail" | "1" | "2" => Some(Outcome::Forgot),
            _ => None,
        }
    }

    pub fn from_rating(rating: i32) -> Option<Self> {
        match rating {
            1 | 2 => Some(Outcome::Forgot),
            3 => Some(Outcome::Kinda),
            4 | 5 => Some(Outcome::Remembered),
            _ => None,
        }
    }
}

// Where a completion came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    Web,
    Extension,
    DailyChallenge,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Web => "web",
            Source::Extension => "extension",
            Source::DailyChallenge => "daily_challenge",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "web" | "w" => Some(Source::Web),
            "extension" | "ext" | "e" => Some(Source::Extension),
            "daily_challenge" | "daily-challenge" | "daily" | "d" => Some(Source::DailyChallenge),
            _ => None,
        }
    }
}

// Ledger entry kinds. Distinct kinds are credited independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XpKind {
    Review,
    DailyChallenge,
    Achievement,
}

impl XpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            XpKind::Review => "review",
            XpKind::DailyChallenge => "daily_challenge",
            XpKind::Achievement => "achievement",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "review" => Some(XpKind::Review),
            "daily_challenge" => Some(XpKind::DailyChallenge),
            "achievement" => Some(XpKind::Achievement),
            _ => None,
        }
    }
}

// One tracked problem per (user, platform, slug). Schedule fields are
// mutated only by the completion engine after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedProblem {
    pub id: i64,
    pub user_id: String,
    pub platform: String,
    pub slug: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub difficulty: Difficulty,
    pub interval_days: i64,
    pub review_count: i64,
    pub next_review_at: String,
    pub last_reviewed_at: Option<String>,
    pub created_at: String,
}

impl TrackedProblem {
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.slug)
    }
}

// Immutable record of one completion attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewLogEntry {
    pub id: i64,
    pub user_id: String,
    pub problem_id: i64,
    pub outcome: Outcome,
    pub source: Source,
    pub time_spent_ms: Option<i64>,
    pub interval_days: i64,
    pub xp_granted: i64,
    pub day_key: String,
    pub time_zone: String,
    pub reviewed_at: String,
}

// Append-only XP credit. At most one row per (user, problem, day_key, kind).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpLedgerEntry {
    pub id: i64,
    pub user_id: String,
    pub problem_id: Option<i64>,
    pub kind: XpKind,
    pub day_key: String,
    pub amount: i64,
    pub created_at: String,
}

// Per-user denormalized aggregate, upserted only inside the completion
// transaction. friends_count belongs to the social collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: String,
    pub total_reviews: i64,
    pub total_xp: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_day_key: Option<String>,
    pub reviews_this_week: i64,
    pub week_key: Option<String>,
    pub friends_count: i64,
    pub last_reviewed_at: Option<String>,
}

impl UserStats {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            total_reviews: 0,
            total_xp: 0,
            current_streak: 0,
            longest_streak: 0,
            last_day_key: None,
            reviews_this_week: 0,
            week_key: None,
            friends_count: 0,
            last_reviewed_at: None,
        }
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
