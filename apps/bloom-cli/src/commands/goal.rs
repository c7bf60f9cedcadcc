// goal.rs — Goal subcommands: create, progress, delete, list, show.

use anyhow::Context;
use bloom_goal::{
    engine, GoalController, GoalError, GoalStatus, GoalStore, GoalSummary, NewGoal, SystemClock,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Subcommand;

use crate::config::BloomConfig;

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a new goal.
    Create {
        /// Goal title (e.g., "Read more").
        title: String,
        /// Category: health, productivity, learning, relationships, finance,
        /// creativity, mindfulness, or any custom tag.
        #[arg(long)]
        category: String,
        /// Quantity to reach.
        #[arg(long)]
        target: f64,
        /// Unit of measurement (e.g., "books", "km").
        #[arg(long, default_value = "")]
        unit: String,
        /// Deadline as RFC 3339 or YYYY-MM-DD.
        #[arg(long, conflicts_with = "days")]
        deadline: Option<String>,
        /// Deadline as a number of days from now.
        #[arg(long, default_value_t = 30)]
        days: i64,
        /// Longer description.
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Set the progress value of a goal.
    Progress {
        /// Goal ID.
        id: String,
        /// New progress value.
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Delete a goal.
    Delete {
        /// Goal ID.
        id: String,
    },
    /// List all goals, newest first.
    List {
        /// Filter by status (active, completed, overdue).
        #[arg(long)]
        status: Option<GoalStatus>,
        /// Print summaries as a JSON array instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Show details and milestones for a goal.
    Show {
        /// Goal ID.
        id: String,
        /// Print the stored record and its summary as JSON.
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(cmd: &GoalCommands, config: &BloomConfig) -> anyhow::Result<()> {
    let store = GoalStore::with_key(config.backend()?, config.storage.key.clone());
    let mut controller =
        GoalController::new(store, Box::new(SystemClock)).with_dispatcher(config.dispatcher());

    match cmd {
        GoalCommands::Create {
            title,
            category,
            target,
            unit,
            deadline,
            days,
            description,
        } => {
            let deadline = match deadline {
                Some(raw) => parse_deadline(raw)?,
                None => Utc::now() + Duration::days(*days),
            };
            let input = NewGoal::new(
                title.as_str(),
                category.as_str(),
                *target,
                unit.as_str(),
                deadline,
            )
            .with_description(description.as_str());
            create_goal(&mut controller, input)
        }
        GoalCommands::Progress { id, value } => update_progress(&mut controller, id, *value),
        GoalCommands::Delete { id } => delete_goal(&mut controller, id),
        GoalCommands::List { status, json: true } => {
            println!("{}", list_json(&controller, *status)?);
            Ok(())
        }
        GoalCommands::List { status, json: false } => list_goals(&controller, *status),
        GoalCommands::Show { id, json: true } => {
            println!("{}", show_json(&controller, id)?);
            Ok(())
        }
        GoalCommands::Show { id, json: false } => show_goal(&controller, id),
    }
}

fn create_goal(controller: &mut GoalController, input: NewGoal) -> anyhow::Result<()> {
    let goal = controller.create_goal(input).map_err(unsaved)?;

    println!("Goal created: {}", goal.id);
    println!("  Title:    {}", goal.title);
    println!("  Target:   {} {}", goal.target, goal.unit);
    println!("  Deadline: {}", goal.deadline.to_rfc3339());
    let thresholds: Vec<&str> = goal.milestones.iter().map(|m| m.title.as_str()).collect();
    println!("  Milestones: {}", thresholds.join(", "));

    Ok(())
}

fn update_progress(controller: &mut GoalController, id: &str, value: f64) -> anyhow::Result<()> {
    let goal = controller.update_progress(id, value).map_err(unsaved)?;
    let percent = engine::compute_progress_percent(goal.current, goal.target);

    println!(
        "{}: {} / {} {} ({:.0}%), {}",
        goal.title, goal.current, goal.target, goal.unit, percent, goal.status
    );

    Ok(())
}

fn delete_goal(controller: &mut GoalController, id: &str) -> anyhow::Result<()> {
    let title = controller.get(id).map(|g| g.title.clone());
    let removed = controller.delete_goal(id).map_err(unsaved)?;

    match (removed, title) {
        (true, Some(title)) => println!("Deleted goal: {} ({})", title, id),
        _ => println!("No goal with ID {}; nothing deleted.", id),
    }

    Ok(())
}

fn filtered_summaries(controller: &GoalController, status: Option<GoalStatus>) -> Vec<GoalSummary> {
    controller
        .summaries()
        .into_iter()
        .filter(|s| status.map_or(true, |wanted| s.status == wanted))
        .collect()
}

fn list_json(controller: &GoalController, status: Option<GoalStatus>) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&filtered_summaries(
        controller, status,
    ))?)
}

fn list_goals(controller: &GoalController, status: Option<GoalStatus>) -> anyhow::Result<()> {
    let summaries = filtered_summaries(controller, status);

    if summaries.is_empty() {
        println!("No goals found.");
        return Ok(());
    }

    println!(
        "{:<38} {:<24} {:<14} {:>8} {:<10} {:>6} {:>10}",
        "ID", "TITLE", "CATEGORY", "PROGRESS", "STATUS", "DAYS", "MILESTONES"
    );
    println!("{}", "-".repeat(116));

    for s in &summaries {
        println!(
            "{:<38} {:<24} {:<14} {:>7.0}% {:<10} {:>6} {:>10}",
            s.id,
            truncate(&s.title, 22),
            truncate(s.category.as_str(), 14),
            s.progress_percent,
            s.status.to_string(),
            s.days_remaining,
            format!("{}/{}", s.milestones_completed, s.milestones_total),
        );
    }
    println!("\n{} goal(s) total.", summaries.len());

    Ok(())
}

fn show_json(controller: &GoalController, id: &str) -> anyhow::Result<String> {
    let goal = controller
        .get(id)
        .ok_or_else(|| GoalError::NotFound(id.to_string()))?;
    let view = serde_json::json!({
        "goal": goal,
        "summary": engine::summarize(goal, Utc::now()),
    });
    Ok(serde_json::to_string_pretty(&view)?)
}

fn show_goal(controller: &GoalController, id: &str) -> anyhow::Result<()> {
    let goal = controller
        .get(id)
        .ok_or_else(|| GoalError::NotFound(id.to_string()))?;
    let summary = engine::summarize(goal, Utc::now());

    println!("Goal:      {}", goal.id);
    println!("Title:     {}", goal.title);
    if !goal.description.is_empty() {
        println!("About:     {}", goal.description);
    }
    println!("Category:  {}", goal.category);
    println!(
        "Progress:  {} / {} {} ({:.0}%)",
        goal.current, goal.target, goal.unit, summary.progress_percent
    );
    println!("Status:    {}", summary.status);
    println!(
        "Deadline:  {} ({} day(s) left)",
        goal.deadline.to_rfc3339(),
        summary.days_remaining
    );
    println!("Created:   {}", goal.created_at.to_rfc3339());

    if !goal.milestones.is_empty() {
        println!("Milestones:");
        for m in &goal.milestones {
            let mark = if m.completed { "x" } else { " " };
            println!("  [{}] {}", mark, m.title);
        }
    }

    Ok(())
}

/// Accepts RFC 3339 timestamps or plain dates (end of that day, UTC).
fn parse_deadline(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid deadline '{}': expected RFC 3339 or YYYY-MM-DD", raw))?;
    let end_of_day = date
        .and_hms_opt(23, 59, 59)
        .context("invalid time of day")?;
    Ok(end_of_day.and_utc())
}

/// Persistence failures leave the change in memory only; say so.
fn unsaved(e: GoalError) -> anyhow::Error {
    if e.is_persistence() {
        anyhow::Error::new(e).context("change applied but could not be saved")
    } else {
        e.into()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}
