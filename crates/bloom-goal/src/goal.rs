// goal.rs — Goal and Milestone: the persisted data model.
//
// Records serialize with camelCase field names so the stored JSON keeps the
// shape the rest of the application reads:
//   { id, title, description, category, target, current, unit,
//     deadline, status, createdAt, milestones: [{ id, title, target, completed }] }
//
// `status` and every milestone's `completed` flag are derived values. They
// are stored for the benefit of readers, but only `engine::apply_progress`
// ever changes them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived state of a goal relative to its target and deadline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Overdue,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalStatus::Active => write!(f, "active"),
            GoalStatus::Completed => write!(f, "completed"),
            GoalStatus::Overdue => write!(f, "overdue"),
        }
    }
}

impl std::str::FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GoalStatus::Active),
            "completed" => Ok(GoalStatus::Completed),
            "overdue" => Ok(GoalStatus::Overdue),
            other => Err(format!(
                "unknown status '{}' (expected active, completed or overdue)",
                other
            )),
        }
    }
}

/// Category tag for a goal.
///
/// The known tags are what the UI offers; anything else is kept verbatim in
/// `Custom`. On the wire a category is always a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GoalCategory {
    Health,
    Productivity,
    Learning,
    Relationships,
    Finance,
    Creativity,
    Mindfulness,
    Custom(String),
}

impl GoalCategory {
    pub const KNOWN: [GoalCategory; 7] = [
        GoalCategory::Health,
        GoalCategory::Productivity,
        GoalCategory::Learning,
        GoalCategory::Relationships,
        GoalCategory::Finance,
        GoalCategory::Creativity,
        GoalCategory::Mindfulness,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            GoalCategory::Health => "health",
            GoalCategory::Productivity => "productivity",
            GoalCategory::Learning => "learning",
            GoalCategory::Relationships => "relationships",
            GoalCategory::Finance => "finance",
            GoalCategory::Creativity => "creativity",
            GoalCategory::Mindfulness => "mindfulness",
            GoalCategory::Custom(s) => s,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl From<String> for GoalCategory {
    fn from(s: String) -> Self {
        match s.as_str() {
            "health" => GoalCategory::Health,
            "productivity" => GoalCategory::Productivity,
            "learning" => GoalCategory::Learning,
            "relationships" => GoalCategory::Relationships,
            "finance" => GoalCategory::Finance,
            "creativity" => GoalCategory::Creativity,
            "mindfulness" => GoalCategory::Mindfulness,
            _ => GoalCategory::Custom(s),
        }
    }
}

impl From<&str> for GoalCategory {
    fn from(s: &str) -> Self {
        GoalCategory::from(s.to_string())
    }
}

impl From<GoalCategory> for String {
    fn from(c: GoalCategory) -> Self {
        match c {
            GoalCategory::Custom(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sub-threshold of a goal's target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Milestone {
    /// Unique within the parent goal (`milestone-<index>`).
    pub id: String,

    /// Threshold plus unit, e.g. "6 books".
    pub title: String,

    /// Threshold value, never above the goal's target.
    pub target: f64,

    /// Whether the goal's progress has reached `target`.
    pub completed: bool,
}

/// A user-defined target with progress tracking and derived status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    pub category: GoalCategory,

    /// Quantity to reach; always positive for goals built by the controller.
    pub target: f64,

    /// Progress so far. May exceed `target`, and is stored even when it is
    /// not a finite number.
    #[serde(with = "progress_value")]
    pub current: f64,

    #[serde(default)]
    pub unit: String,

    pub deadline: DateTime<Utc>,

    pub status: GoalStatus,

    /// Set once at creation.
    pub created_at: DateTime<Utc>,

    /// Generated once at creation. Legacy records without the field load
    /// with no milestones.
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

/// Serde adapter for progress values.
///
/// JSON has no representation for NaN or infinities (serde_json writes them as
/// `null`), so non-finite values are stored as the strings `"NaN"`,
/// `"Infinity"` and `"-Infinity"`. Reading also accepts `null` as NaN, which
/// is what earlier versions wrote for such values.
pub mod progress_value {
    use serde::{Deserialize, Deserializer, Serializer};

    const NAN: &str = "NaN";
    const INFINITY: &str = "Infinity";
    const NEG_INFINITY: &str = "-Infinity";

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str(NAN)
        } else if *value == f64::INFINITY {
            serializer.serialize_str(INFINITY)
        } else if *value == f64::NEG_INFINITY {
            serializer.serialize_str(NEG_INFINITY)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Option::<Stored>::deserialize(deserializer)? {
            Some(Stored::Number(n)) => Ok(n),
            Some(Stored::Text(text)) => match text.as_str() {
                NAN => Ok(f64::NAN),
                INFINITY => Ok(f64::INFINITY),
                NEG_INFINITY => Ok(f64::NEG_INFINITY),
                other => Err(serde::de::Error::custom(format!(
                    "invalid progress value '{}'",
                    other
                ))),
            },
            None => Ok(f64::NAN),
        }
    }
}

/// Raw input for creating a goal, as supplied by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: GoalCategory,
    pub target: f64,
    #[serde(default)]
    pub unit: String,
    pub deadline: DateTime<Utc>,
}

impl NewGoal {
    pub fn new(
        title: impl Into<String>,
        category: impl Into<GoalCategory>,
        target: f64,
        unit: impl Into<String>,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category: category.into(),
            target,
            unit: unit.into(),
            deadline,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
