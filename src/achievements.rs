//! Achievement catalogue and unlock evaluation.
//!
//! Achievement IDs are stable snake_case strings; the static table below is
//! the canonical source of truth. Predicates only look at counters that
//! never decrease (streak rules read the longest streak, not the current
//! one), so an unlocked achievement can never "re-lock".

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

// Review milestones
pub const FIRST_REVIEW: &str = "first_review";
pub const REVIEWS_10: &str = "reviews_10";
pub const REVIEWS_50: &str = "reviews_50";
pub const REVIEWS_100: &str = "reviews_100";
pub const REVIEWS_500: &str = "reviews_500";
// Streak milestones (longest streak)
pub const STREAK_3: &str = "streak_3";
pub const STREAK_7: &str = "streak_7";
pub const STREAK_30: &str = "streak_30";
pub const STREAK_100: &str = "streak_100";
// Tracked-problem milestones
pub const PROBLEMS_10: &str = "problems_10";
pub const PROBLEMS_50: &str = "problems_50";
pub const PROBLEMS_100: &str = "problems_100";
// Social milestones
pub const FRIENDS_1: &str = "friends_1";
pub const FRIENDS_10: &str = "friends_10";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
        }
    }
}

// Snapshot of the aggregates a predicate may look at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementContext {
    pub total_reviews: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub problems_tracked: i64,
    pub friends_count: i64,
}

pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub tier: Tier,
    pub xp_reward: i64,
    check: fn(&AchievementContext) -> bool,
}

impl AchievementDef {
    pub fn qualifies(&self, ctx: &AchievementContext) -> bool {
        (self.check)(ctx)
    }
}

static ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: FIRST_REVIEW,
        title: "First Review",
        tier: Tier::Bronze,
        xp_reward: 25,
        check: |c| c.total_reviews >= 1,
    },
    AchievementDef {
        id: REVIEWS_10,
        title: "Ten Down",
        tier: Tier::Bronze,
        xp_reward: 50,
        check: |c| c.total_reviews >= 10,
    },
    AchievementDef {
        id: REVIEWS_50,
        title: "Fifty Strong",
        tier: Tier::Silver,
        xp_reward: 100,
        check: |c| c.total_reviews >= 50,
    },
    AchievementDef {
        id: REVIEWS_100,
        title: "Century Club",
        tier: Tier::Silver,
        xp_reward: 200,
        check: |c| c.total_reviews >= 100,
    },
    AchievementDef {
        id: REVIEWS_500,
        title: "Relentless",
        tier: Tier::Gold,
        xp_reward: 500,
        check: |c| c.total_reviews >= 500,
    },
    AchievementDef {
        id: STREAK_3,
        title: "Warming Up",
        tier: Tier::Bronze,
        xp_reward: 25,
        check: |c| c.longest_streak >= 3,
    },
    AchievementDef {
        id: STREAK_7,
        title: "Full Week",
        tier: Tier::Silver,
        xp_reward: 75,
        check: |c| c.longest_streak >= 7,
    },
    AchievementDef {
        id: STREAK_30,
        title: "Monthly Habit",
        tier: Tier::Gold,
        xp_reward: 300,
        check: |c| c.longest_streak >= 30,
    },
    AchievementDef {
        id: STREAK_100,
        title: "Centurion",
        tier: Tier::Gold,
        xp_reward: 1000,
        check: |c| c.longest_streak >= 100,
    },
    AchievementDef {
        id: PROBLEMS_10,
        title: "Collector",
        tier: Tier::Bronze,
        xp_reward: 25,
        check: |c| c.problems_tracked >= 10,
    },
    AchievementDef {
        id: PROBLEMS_50,
        title: "Curator",
        tier: Tier::Silver,
        xp_reward: 100,
        check: |c| c.problems_tracked >= 50,
    },
    AchievementDef {
        id: PROBLEMS_100,
        title: "Archivist",
        tier: Tier::Gold,
        xp_reward: 250,
        check: |c| c.problems_tracked >= 100,
    },
    AchievementDef {
        id: FRIENDS_1,
        title: "Study Buddy",
        tier: Tier::Bronze,
        xp_reward: 25,
        check: |c| c.friends_count >= 1,
    },
    AchievementDef {
        id: FRIENDS_10,
        title: "Squad",
        tier: Tier::Silver,
        xp_reward: 100,
        check: |c| c.friends_count >= 10,
    },
];

pub fn definitions() -> &'static [AchievementDef] {
    ACHIEVEMENTS
}

/// Achievements that newly qualify: every rule whose predicate holds for the
/// snapshot and whose id is not already unlocked. Pure; persisting the ids
/// and crediting the rewards is the caller's job.
pub fn evaluate(
    ctx: &AchievementContext,
    already_unlocked: &HashSet<String>,
) -> Vec<&'static AchievementDef> {
    ACHIEVEMENTS
        .iter()
        .filter(|def| !already_unlocked.contains(def.id))
        .filter(|def| def.qualifies(ctx))
        .collect()
}
