// engine.rs — Pure goal computations.
//
// Nothing here holds on to a goal or touches storage. Every function takes
// values (and an explicit `now` where time matters) and returns new values,
// so the controller can compute the next state before committing it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::goal::{Goal, GoalCategory, GoalStatus, Milestone};

/// Upper bound on milestones generated for a single goal.
pub const MAX_MILESTONES: usize = 5;

/// One milestone step per this many units of target.
const UNITS_PER_STEP: f64 = 10.0;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Number of milestones a goal with `target` gets: `min(5, ceil(target / 10))`,
/// never less than one.
pub fn milestone_steps(target: f64) -> usize {
    let steps = (target / UNITS_PER_STEP).ceil();
    if steps.is_nan() || steps < 1.0 {
        1
    } else if steps >= MAX_MILESTONES as f64 {
        MAX_MILESTONES
    } else {
        steps as usize
    }
}

/// Evenly spaced milestones up to `target`.
///
/// Thresholds are `round(target * i / steps)`; the last one is always the
/// target itself so that reaching the goal completes every milestone.
pub fn generate_milestones(target: f64, unit: &str) -> Vec<Milestone> {
    let steps = milestone_steps(target);
    (1..=steps)
        .map(|i| {
            let threshold = if i == steps {
                target
            } else {
                (target * i as f64 / steps as f64).round()
            };
            Milestone {
                id: format!("milestone-{}", i),
                title: format!("{} {}", threshold, unit).trim_end().to_string(),
                target: threshold,
                completed: false,
            }
        })
        .collect()
}

/// Completion wins over the deadline: a goal that reaches its target late is
/// `Completed`, never `Overdue`.
pub fn compute_status(
    current: f64,
    target: f64,
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
) -> GoalStatus {
    if current >= target {
        GoalStatus::Completed
    } else if now > deadline {
        GoalStatus::Overdue
    } else {
        GoalStatus::Active
    }
}

/// Progress as a percentage in `[0, 100]`.
pub fn compute_progress_percent(current: f64, target: f64) -> f64 {
    let percent = current / target * 100.0;
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0)
}

/// Whole days until `deadline`, rounded up. Zero or negative once it passes.
pub fn compute_days_remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (deadline - now).num_milliseconds() as f64;
    (ms / MS_PER_DAY).ceil() as i64
}

/// Returns `goal` with `current` replaced and every derived field recomputed.
pub fn apply_progress(goal: &Goal, new_current: f64, now: DateTime<Utc>) -> Goal {
    let mut next = goal.clone();
    next.current = new_current;
    next.status = compute_status(new_current, goal.target, goal.deadline, now);
    for milestone in &mut next.milestones {
        milestone.completed = new_current >= milestone.target;
    }
    next
}

/// Milestones complete in `after` but not in `before`, in milestone order.
pub fn newly_completed_milestones<'a>(before: &Goal, after: &'a Goal) -> Vec<&'a Milestone> {
    after
        .milestones
        .iter()
        .filter(|m| m.completed)
        .filter(|m| {
            !before
                .milestones
                .iter()
                .any(|prev| prev.id == m.id && prev.completed)
        })
        .collect()
}

/// Read model handed to the presentation layer.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalSummary {
    pub id: String,
    pub title: String,
    pub category: GoalCategory,
    #[serde(serialize_with = "crate::goal::progress_value::serialize")]
    pub current: f64,
    pub target: f64,
    pub unit: String,
    /// Status as of the time the summary was taken.
    pub status: GoalStatus,
    pub progress_percent: f64,
    pub days_remaining: i64,
    pub milestones_completed: usize,
    pub milestones_total: usize,
}

/// Summarize `goal` for display at `now`.
///
/// The stored status only changes with progress; the summary re-derives it so
/// a goal whose deadline slipped by since its last update shows as overdue.
pub fn summarize(goal: &Goal, now: DateTime<Utc>) -> GoalSummary {
    GoalSummary {
        id: goal.id.clone(),
        title: goal.title.clone(),
        category: goal.category.clone(),
        current: goal.current,
        target: goal.target,
        unit: goal.unit.clone(),
        status: compute_status(goal.current, goal.target, goal.deadline, now),
        progress_percent: compute_progress_percent(goal.current, goal.target),
        days_remaining: compute_days_remaining(goal.deadline, now),
        milestones_completed: goal.milestones.iter().filter(|m| m.completed).count(),
        milestones_total: goal.milestones.len(),
    }
}
