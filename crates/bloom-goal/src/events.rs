// events.rs — Goal events and notification dispatch.
//
// The controller emits an event after each successful mutation. Sinks turn
// them into whatever the host application shows the user: an entry in a log,
// a desktop notification, a push message. Delivery is synchronous and
// best-effort; a failing sink never affects the goal collection.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GoalError;
use crate::goal::{Goal, Milestone};

/// Events emitted at goal lifecycle points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GoalEvent {
    /// A new goal was added to the collection.
    GoalCreated {
        goal_id: String,
        title: String,
        target: f64,
        unit: String,
        timestamp: DateTime<Utc>,
    },

    /// A goal's progress value changed.
    ProgressUpdated {
        goal_id: String,
        #[serde(with = "crate::goal::progress_value")]
        from: f64,
        #[serde(with = "crate::goal::progress_value")]
        to: f64,
        timestamp: DateTime<Utc>,
    },

    /// Progress crossed a milestone threshold.
    MilestoneReached {
        goal_id: String,
        goal_title: String,
        milestone_id: String,
        milestone_title: String,
        timestamp: DateTime<Utc>,
    },

    /// A goal reached its target.
    GoalCompleted {
        goal_id: String,
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// A goal was removed from the collection.
    GoalDeleted {
        goal_id: String,
        title: String,
        timestamp: DateTime<Utc>,
    },
}

impl GoalEvent {
    /// Get the event type name as a string.
    pub fn event_type(&self) -> &str {
        match self {
            GoalEvent::GoalCreated { .. } => "goal_created",
            GoalEvent::ProgressUpdated { .. } => "progress_updated",
            GoalEvent::MilestoneReached { .. } => "milestone_reached",
            GoalEvent::GoalCompleted { .. } => "goal_completed",
            GoalEvent::GoalDeleted { .. } => "goal_deleted",
        }
    }

    /// Short human-readable text suitable for a notification body.
    pub fn message(&self) -> String {
        match self {
            GoalEvent::GoalCreated {
                title, target, unit, ..
            } if unit.is_empty() => format!("New goal: {} ({})", title, target),
            GoalEvent::GoalCreated {
                title, target, unit, ..
            } => format!("New goal: {} ({} {})", title, target, unit),
            GoalEvent::ProgressUpdated { from, to, .. } => {
                format!("Progress updated from {} to {}", from, to)
            }
            GoalEvent::MilestoneReached {
                goal_title,
                milestone_title,
                ..
            } => format!("Milestone reached for {}: {}", goal_title, milestone_title),
            GoalEvent::GoalCompleted { title, .. } => format!("Goal completed: {}", title),
            GoalEvent::GoalDeleted { title, .. } => format!("Goal deleted: {}", title),
        }
    }

    pub fn goal_created(goal: &Goal, timestamp: DateTime<Utc>) -> Self {
        GoalEvent::GoalCreated {
            goal_id: goal.id.clone(),
            title: goal.title.clone(),
            target: goal.target,
            unit: goal.unit.clone(),
            timestamp,
        }
    }

    pub fn progress_updated(goal_id: &str, from: f64, to: f64, timestamp: DateTime<Utc>) -> Self {
        GoalEvent::ProgressUpdated {
            goal_id: goal_id.to_string(),
            from,
            to,
            timestamp,
        }
    }

    pub fn milestone_reached(goal: &Goal, milestone: &Milestone, timestamp: DateTime<Utc>) -> Self {
        GoalEvent::MilestoneReached {
            goal_id: goal.id.clone(),
            goal_title: goal.title.clone(),
            milestone_id: milestone.id.clone(),
            milestone_title: milestone.title.clone(),
            timestamp,
        }
    }

    pub fn goal_completed(goal: &Goal, timestamp: DateTime<Utc>) -> Self {
        GoalEvent::GoalCompleted {
            goal_id: goal.id.clone(),
            title: goal.title.clone(),
            timestamp,
        }
    }

    pub fn goal_deleted(goal: &Goal, timestamp: DateTime<Utc>) -> Self {
        GoalEvent::GoalDeleted {
            goal_id: goal.id.clone(),
            title: goal.title.clone(),
            timestamp,
        }
    }
}

/// Receiver of goal events.
pub trait NotificationSink: Send {
    /// Deliver one event. Errors are logged by the dispatcher and otherwise ignored.
    fn notify(&self, event: &GoalEvent) -> Result<(), GoalError>;
}

/// Appends events as JSONL to a file.
///
/// The file is opened on the first event and held for the life of the sink;
/// each line is flushed as it is written.
pub struct LogSink {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl LogSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            writer: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> GoalError {
        GoalError::IoError {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn open(&self) -> Result<BufWriter<File>, GoalError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| GoalError::IoError {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        Ok(BufWriter::new(file))
    }
}

impl NotificationSink for LogSink {
    fn notify(&self, event: &GoalEvent) -> Result<(), GoalError> {
        let line = serde_json::to_string(event)?;

        let mut guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_none() {
            *guard = Some(self.open()?);
        }
        if let Some(writer) = guard.as_mut() {
            let written = writeln!(writer, "{}", line).and_then(|_| writer.flush());
            if let Err(e) = written {
                // Reopen on the next event rather than keep a broken handle.
                *guard = None;
                return Err(self.io_error(e));
            }
        }
        Ok(())
    }
}

/// Emits each event through `tracing` at info level.
#[derive(Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, event: &GoalEvent) -> Result<(), GoalError> {
        tracing::info!(event_type = event.event_type(), "{}", event.message());
        Ok(())
    }
}

/// A sink plus the event types it wants. `None` means every type.
struct Subscription {
    sink: Box<dyn NotificationSink>,
    event_types: Option<Vec<String>>,
}

impl Subscription {
    fn wants(&self, event: &GoalEvent) -> bool {
        match &self.event_types {
            Some(types) => types.iter().any(|t| t == event.event_type()),
            None => true,
        }
    }
}

/// Routes events to subscribed sinks.
#[derive(Default)]
pub struct EventDispatcher {
    subscriptions: Vec<Subscription>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `sink` to every event type.
    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.subscriptions.push(Subscription {
            sink,
            event_types: None,
        });
    }

    /// Subscribe `sink` to the listed event types only (e.g. `"goal_completed"`).
    pub fn subscribe<I, S>(&mut self, sink: Box<dyn NotificationSink>, event_types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subscriptions.push(Subscription {
            sink,
            event_types: Some(event_types.into_iter().map(Into::into).collect()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Deliver `event` to every interested sink; returns how many accepted it.
    pub fn dispatch(&self, event: &GoalEvent) -> usize {
        let mut delivered = 0;
        for subscription in self.subscriptions.iter().filter(|s| s.wants(event)) {
            match subscription.sink.notify(event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(event_type = event.event_type(), "notification sink error: {}", e)
                }
            }
        }
        delivered
    }
}
