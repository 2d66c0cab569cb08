mod achievements;
mod db;
mod engine;
mod models;
mod schedule;
mod streak;
mod xp;

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use db::Database;
use engine::{CompleteReviewRequest, EngineError};
use models::{Difficulty, JsonOutput, Outcome, Source};

const DEFAULT_DB_NAME: &str = "grindstone.db";
const DEFAULT_TZ: &str = "UTC";

#[derive(Parser)]
#[command(name = "grindstone")]
#[command(about = "Spaced-repetition review tracker for coding practice problems")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// User the command acts for
    #[arg(long, short, global = true, default_value = "default")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Manage tracked problems
    #[command(subcommand)]
    Problem(ProblemCommands),

    /// Record a completed review for a problem
    Review {
        /// Problem ID
        id: i64,

        /// Outcome: remembered/kinda/forgot (or a 1-5 rating)
        #[arg(long, short)]
        outcome: String,

        /// Completion source: web/extension/daily_challenge
        #[arg(long, short, default_value = "web")]
        source: String,

        /// Time spent on the attempt, in milliseconds
        #[arg(long)]
        time_spent_ms: Option<i64>,

        /// IANA time zone for streak and XP day bucketing
        #[arg(long, default_value = DEFAULT_TZ)]
        tz: String,
    },

    /// Pick the next due problem (weighted random)
    Next,

    /// Show recent review history
    History {
        /// Only reviews of this problem
        #[arg(long)]
        problem: Option<i64>,
    },

    /// Show the XP ledger
    Xp,

    /// Show review statistics and streaks
    Stats {
        /// IANA time zone for the displayed streak
        #[arg(long, default_value = DEFAULT_TZ)]
        tz: String,
    },

    /// List achievements and unlock status
    Achievements,
}

#[derive(Subcommand)]
enum ProblemCommands {
    /// Start tracking a problem
    Add {
        /// Problem slug, e.g. two-sum
        slug: String,

        /// Platform the problem lives on
        #[arg(long, short, default_value = "leetcode")]
        platform: String,

        /// Difficulty: easy/medium/hard
        #[arg(long, short)]
        difficulty: String,

        /// Human-readable title
        #[arg(long, short)]
        title: Option<String>,

        /// Problem URL
        #[arg(long)]
        url: Option<String>,
    },

    /// List tracked problems
    List {
        /// Only problems due for review
        #[arg(long)]
        due: bool,
    },

    /// Show problem details
    Show {
        /// Problem ID
        id: i64,
    },

    /// Stop tracking a problem
    Delete {
        /// Problem ID
        id: i64,
    },
}

fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("GRINDSTONE_DB") {
        return PathBuf::from(path);
    }

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("grindstone");

    std::fs::create_dir_all(&config_dir).ok();
    config_dir.join(DEFAULT_DB_NAME)
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = get_db_path();
    let mut db = Database::open(&db_path)?;
    let user = cli.user.as_str();

    match cli.command {
        Commands::Init => {
            db.init()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Database initialized at: {}", db_path.display());
            }
        }

        Commands::Problem(problem_cmd) => match problem_cmd {
            ProblemCommands::Add {
                slug,
                platform,
                difficulty,
                title,
                url,
            } => {
                let difficulty = Difficulty::from_str(&difficulty).ok_or_else(|| {
                    format!(
                        "Invalid difficulty '{}'. Use: easy, medium, or hard",
                        difficulty
                    )
                })?;

                let id = db.add_problem(
                    user,
                    &platform,
                    &slug,
                    title.as_deref(),
                    url.as_deref(),
                    difficulty,
                    Utc::now(),
                )?;

                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                            "id": id,
                            "slug": slug
                        })))?
                    );
                } else {
                    println!("Tracking '{}' on {} with ID: {}", slug, platform, id);
                }
            }

            ProblemCommands::List { due } => {
                let problems = db.list_problems(user, due, Utc::now())?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&problems))?);
                } else if problems.is_empty() {
                    println!("No problems found.");
                } else {
                    println!(
                        "{:<5} {:<30} {:<12} {:<8} {:<9} NEXT REVIEW",
                        "ID", "PROBLEM", "PLATFORM", "DIFF", "REVIEWS"
                    );
                    println!("{}", "-".repeat(90));
                    for p in problems {
                        println!(
                            "{:<5} {:<30} {:<12} {:<8} {:<9} {}",
                            p.id,
                            truncate(p.display_name(), 28),
                            p.platform,
                            p.difficulty.label(),
                            p.review_count,
                            p.next_review_at
                        );
                    }
                }
            }

            ProblemCommands::Show { id } => {
                if let Some(p) = db.get_problem(user, id)? {
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(&p))?);
                    } else {
                        println!("Problem: {}", p.display_name());
                        println!("ID: {}", p.id);
                        println!("Platform: {}", p.platform);
                        println!("Slug: {}", p.slug);
                        if let Some(url) = &p.url {
                            println!("URL: {}", url);
                        }
                        println!("Difficulty: {}", p.difficulty.label());
                        println!();
                        println!("--- Schedule ---");
                        println!("Interval: {} days", p.interval_days);
                        println!("Reviews: {}", p.review_count);
                        if let Some(last) = &p.last_reviewed_at {
                            println!("Last reviewed: {}", last);
                        }
                        println!("Next review: {}", p.next_review_at);
                    }
                } else if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("Problem not found"))?
                    );
                } else {
                    println!("Problem not found.");
                }
            }

            ProblemCommands::Delete { id } => {
                if db.delete_problem(user, id)? {
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
                    } else {
                        println!("Problem {} deleted.", id);
                    }
                } else if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("Problem not found"))?
                    );
                } else {
                    println!("Problem not found.");
                }
            }
        },

        Commands::Review {
            id,
            outcome,
            source,
            time_spent_ms,
            tz,
        } => {
            let outcome = Outcome::from_str(&outcome).ok_or_else(|| {
                format!(
                    "Invalid outcome '{}'. Use: remembered, kinda, forgot, or a 1-5 rating",
                    outcome
                )
            })?;
            let source = Source::from_str(&source).ok_or_else(|| {
                format!(
                    "Invalid source '{}'. Use: web, extension, or daily_challenge",
                    source
                )
            })?;

            let request = CompleteReviewRequest {
                user_id: user,
                problem_id: id,
                outcome,
                source,
                time_spent_ms,
                time_zone: &tz,
                now: Utc::now(),
            };

            match db.complete_review(&request) {
                Ok(completion) => {
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(&completion))?);
                    } else {
                        println!(
                            "Review recorded for '{}'. +{} XP",
                            completion.problem.display_name(),
                            completion.xp_earned
                        );
                        println!(
                            "Next review in {} days ({})",
                            completion.problem.interval_days, completion.problem.next_review_at
                        );
                        for id in &completion.new_achievements {
                            if let Some(def) =
                                achievements::definitions().iter().find(|d| d.id == *id)
                            {
                                println!("Achievement unlocked: {} (+{} XP)", def.title, def.xp_reward);
                            }
                        }
                    }
                }
                Err(EngineError::NotFound) => {
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::<()>::err("Problem not found"))?
                        );
                    } else {
                        println!("Problem not found.");
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Next => {
            if let Some(p) = db.next_due_problem(user, Utc::now())? {
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&p))?);
                } else {
                    println!("=== Next Problem to Review ===");
                    println!();
                    println!("{} (ID: {})", p.display_name(), p.id);
                    println!("Platform: {}  Difficulty: {}", p.platform, p.difficulty.label());
                    if let Some(url) = &p.url {
                        println!("URL: {}", url);
                    }
                    println!("Reviews so far: {}", p.review_count);
                    println!();
                    println!("After solving, record the outcome with:");
                    println!("  grindstone review {} --outcome <remembered|kinda|forgot>", p.id);
                }
            } else if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Nothing due for review. Nice.");
            }
        }

        Commands::History { problem } => {
            let entries = db.review_history(user, problem)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&entries))?);
            } else if entries.is_empty() {
                println!("No reviews recorded yet.");
            } else {
                println!(
                    "{:<12} {:<9} {:<12} {:<16} {:<9} XP",
                    "DAY", "PROBLEM", "OUTCOME", "SOURCE", "INTERVAL"
                );
                println!("{}", "-".repeat(70));
                for e in entries {
                    println!(
                        "{:<12} {:<9} {:<12} {:<16} {:<9} {}",
                        e.day_key,
                        e.problem_id,
                        e.outcome.as_str(),
                        e.source.as_str(),
                        e.interval_days,
                        e.xp_granted
                    );
                }
            }
        }

        Commands::Xp => {
            let entries = db.xp_entries(user)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&entries))?);
            } else if entries.is_empty() {
                println!("No XP earned yet.");
            } else {
                println!("{:<12} {:<16} {:<9} AMOUNT", "DAY", "KIND", "PROBLEM");
                println!("{}", "-".repeat(50));
                for e in entries {
                    let problem = e
                        .problem_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<12} {:<16} {:<9} {}",
                        e.day_key,
                        e.kind.as_str(),
                        problem,
                        e.amount
                    );
                }
            }
        }

        Commands::Stats { tz } => {
            let tz: chrono_tz::Tz = tz
                .parse()
                .map_err(|_| format!("Unknown time zone '{}'", tz))?;
            let summary = db.get_summary(user, Utc::now())?;
            let shown_streak = streak::effective_streak(
                summary.stats.last_day_key.as_deref(),
                summary.stats.current_streak,
                Utc::now(),
                tz,
            );

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "problems_tracked": summary.problems_tracked,
                        "due_now": summary.due_now,
                        "total_reviews": summary.stats.total_reviews,
                        "reviews_this_week": summary.stats.reviews_this_week,
                        "total_xp": summary.stats.total_xp,
                        "current_streak": shown_streak,
                        "longest_streak": summary.stats.longest_streak,
                        "achievements_unlocked": summary.achievements_unlocked
                    })))?
                );
            } else {
                println!("=== Review Statistics ===");
                println!("Problems tracked: {}", summary.problems_tracked);
                println!("Due for review: {}", summary.due_now);
                println!("Total reviews: {}", summary.stats.total_reviews);
                println!("Reviews this week: {}", summary.stats.reviews_this_week);
                println!("Total XP: {}", summary.stats.total_xp);
                println!("Current streak: {} days", shown_streak);
                println!("Longest streak: {} days", summary.stats.longest_streak);
                println!(
                    "Achievements: {}/{}",
                    summary.achievements_unlocked,
                    achievements::definitions().len()
                );
            }
        }

        Commands::Achievements => {
            let unlocked = db.unlocked_achievements(user)?;

            if cli.json {
                let rows: Vec<serde_json::Value> = achievements::definitions()
                    .iter()
                    .map(|def| {
                        serde_json::json!({
                            "id": def.id,
                            "title": def.title,
                            "tier": def.tier.as_str(),
                            "xp_reward": def.xp_reward,
                            "unlocked": unlocked.iter().any(|u| u == def.id)
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string(&JsonOutput::ok(rows))?);
            } else {
                println!("{:<4} {:<16} {:<8} {:<6} TITLE", "", "ID", "TIER", "XP");
                println!("{}", "-".repeat(60));
                for def in achievements::definitions() {
                    let mark = if unlocked.iter().any(|u| u == def.id) {
                        "[x]"
                    } else {
                        "[ ]"
                    };
                    println!(
                        "{:<4} {:<16} {:<8} {:<6} {}",
                        mark,
                        def.id,
                        def.tier.as_str(),
                        def.xp_reward,
                        def.title
                    );
                }
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
