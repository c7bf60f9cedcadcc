// store.rs — GoalStore: the owned goal collection and its persistence.
//
// The whole collection lives under one backend key as a JSON array, newest
// goal first. `load` reads it once per session; after that the in-memory
// vector is the source of truth and `save` overwrites the key with the full
// collection every time it changes.

use crate::backend::KeyValueBackend;
use crate::error::GoalError;
use crate::goal::Goal;

/// Backend key the collection is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "smartGoals";

/// Owner of the goal collection.
pub struct GoalStore {
    backend: Box<dyn KeyValueBackend>,
    key: String,
    goals: Vec<Goal>,
}

impl GoalStore {
    /// Create a store over `backend` using [`DEFAULT_STORAGE_KEY`].
    /// The collection starts empty until [`GoalStore::load`] is called.
    pub fn new(backend: Box<dyn KeyValueBackend>) -> Self {
        Self::with_key(backend, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(backend: Box<dyn KeyValueBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            goals: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read and parse the stored collection without touching the in-memory one.
    ///
    /// A missing key is an empty collection. Individual records that fail to
    /// parse are skipped with a warning; a value that is not a JSON array at
    /// all is an error.
    pub fn try_load(&self) -> Result<Vec<Goal>, GoalError> {
        let raw = match self.backend.get(&self.key)? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };

        let records: Vec<serde_json::Value> = serde_json::from_str(&raw)?;
        let mut goals = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Goal>(record) {
                Ok(goal) => goals.push(goal),
                Err(e) => {
                    tracing::warn!(key = %self.key, index, "skipping unreadable goal record: {}", e)
                }
            }
        }
        Ok(goals)
    }

    /// Replace the in-memory collection with what the backend holds.
    ///
    /// Read and parse failures degrade to an empty collection so rendering
    /// can always proceed.
    pub fn load(&mut self) -> &[Goal] {
        self.goals = match self.try_load() {
            Ok(goals) => {
                tracing::debug!(key = %self.key, count = goals.len(), "loaded goals");
                goals
            }
            Err(e) => {
                tracing::warn!(key = %self.key, "failed to load goals, starting empty: {}", e);
                Vec::new()
            }
        };
        &self.goals
    }

    /// Write the full collection under the store key, replacing prior content.
    ///
    /// On failure the in-memory collection is left as it is.
    pub fn save(&mut self) -> Result<(), GoalError> {
        let json = serde_json::to_string(&self.goals)?;
        self.backend.set(&self.key, &json)?;
        tracing::debug!(key = %self.key, count = self.goals.len(), "saved goals");
        Ok(())
    }

    /// The collection, newest first.
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn get(&self, goal_id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == goal_id)
    }

    pub(crate) fn goals_mut(&mut self) -> &mut Vec<Goal> {
        &mut self.goals
    }

    pub fn backend(&self) -> &dyn KeyValueBackend {
        self.backend.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FileBackend, MemoryBackend};
    use crate::engine;
    use crate::goal::{GoalCategory, GoalStatus};
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::tempdir;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, 8, 15, 30).unwrap()
    }

    fn make_goal(id: &str, title: &str, target: f64) -> Goal {
        Goal {
            id: id.to_string(),
            title: title.to_string(),
            description: format!("{} description", title),
            category: GoalCategory::Productivity,
            target,
            current: 0.0,
            unit: "tasks".to_string(),
            deadline: at(30),
            status: GoalStatus::Active,
            created_at: at(1),
            milestones: engine::generate_milestones(target, "tasks"),
        }
    }

    #[test]
    fn load_missing_key_is_empty() {
        let mut store = GoalStore::new(Box::new(MemoryBackend::new()));
        assert!(store.load().is_empty());
        assert!(store.try_load().unwrap().is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let goals = vec![
            make_goal("b", "Second", 40.0),
            engine::apply_progress(&make_goal("a", "First", 12.0), 7.0, at(2)),
        ];

        {
            let mut store = GoalStore::new(Box::new(FileBackend::new(dir.path()).unwrap()));
            store.goals_mut().extend(goals.clone());
            store.save().unwrap();
        }

        let mut store = GoalStore::new(Box::new(FileBackend::new(dir.path()).unwrap()));
        let loaded = store.load().to_vec();
        assert_eq!(loaded, goals);
        assert_eq!(loaded[0].id, "b");
        assert_eq!(loaded[1].created_at, at(1));
        assert_eq!(loaded[1].deadline, at(30));
    }

    #[test]
    fn dates_are_stored_as_iso_strings() {
        let mut store = GoalStore::new(Box::new(MemoryBackend::new()));
        store.goals_mut().push(make_goal("a", "First", 12.0));
        store.save().unwrap();

        let raw = store.backend().get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["deadline"], "2026-10-30T08:15:30Z");
        assert_eq!(value[0]["createdAt"], "2026-10-01T08:15:30Z");
        assert_eq!(value[0]["milestones"][1]["target"], 12.0);
    }

    #[test]
    fn empty_collection_saves_as_empty_array() {
        let mut store = GoalStore::new(Box::new(MemoryBackend::new()));
        store.save().unwrap();
        let raw = store.backend().get(DEFAULT_STORAGE_KEY).unwrap();
        assert_eq!(raw.as_deref(), Some("[]"));
    }

    #[test]
    fn corrupted_json_degrades_to_empty() {
        let mut backend = MemoryBackend::new();
        backend.insert(DEFAULT_STORAGE_KEY, "{not json");
        let mut store = GoalStore::new(Box::new(backend));

        assert!(matches!(
            store.try_load(),
            Err(GoalError::SerializationError(_))
        ));
        assert!(store.load().is_empty());
    }

    #[test]
    fn unreadable_records_are_skipped() {
        let mut backend = MemoryBackend::new();
        let good = serde_json::to_value(make_goal("ok", "Fine", 10.0)).unwrap();
        let raw = serde_json::json!([good, { "id": "broken", "deadline": "yesterday" }]);
        backend.insert(DEFAULT_STORAGE_KEY, raw.to_string());

        let mut store = GoalStore::new(Box::new(backend));
        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "ok");
    }

    #[test]
    fn legacy_records_without_milestones_load() {
        let mut backend = MemoryBackend::new();
        backend.insert(
            "legacyKey",
            r#"[{"id":"1697000000000","title":"Walk","description":"","category":"health",
                "target":10000,"current":2500,"unit":"steps",
                "deadline":"2026-10-20T00:00:00.000Z","status":"active",
                "createdAt":"2026-10-01T12:00:00.000Z"}]"#,
        );
        let mut store = GoalStore::with_key(Box::new(backend), "legacyKey");
        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].milestones.is_empty());
        assert_eq!(
            loaded[0].created_at,
            Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn failed_save_keeps_memory_state() {
        let mut store = GoalStore::new(Box::new(MemoryBackend::with_quota(16)));
        store.goals_mut().push(make_goal("a", "First", 12.0));

        let err = store.save().unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(store.goals().len(), 1);
        assert!(store.get("a").is_some());
    }
}
