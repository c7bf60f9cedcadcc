// controller.rs — GoalController: user actions over the goal collection.
//
// Each action is one transaction: validate, compute the next value with the
// engine, mutate the collection held by the store, persist the whole
// collection, then notify sinks. The collection is loaded exactly once, when
// the controller is built.
//
// A failed save is returned to the caller but the in-memory change stays;
// the next successful save writes it out.

use uuid::Uuid;

use crate::clock::Clock;
use crate::engine::{self, GoalSummary};
use crate::error::GoalError;
use crate::events::{EventDispatcher, GoalEvent};
use crate::goal::{Goal, GoalStatus, NewGoal};
use crate::store::GoalStore;

pub struct GoalController {
    store: GoalStore,
    clock: Box<dyn Clock>,
    dispatcher: EventDispatcher,
}

impl GoalController {
    /// Take ownership of `store` and load its collection.
    pub fn new(mut store: GoalStore, clock: Box<dyn Clock>) -> Self {
        store.load();
        Self {
            store,
            clock,
            dispatcher: EventDispatcher::new(),
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: EventDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// The collection, newest first.
    pub fn goals(&self) -> &[Goal] {
        self.store.goals()
    }

    pub fn get(&self, goal_id: &str) -> Option<&Goal> {
        self.store.get(goal_id)
    }

    /// Display summaries for every goal as of now.
    pub fn summaries(&self) -> Vec<GoalSummary> {
        let now = self.clock.now();
        self.store
            .goals()
            .iter()
            .map(|g| engine::summarize(g, now))
            .collect()
    }

    /// Validate `input` and prepend a new goal built from it.
    pub fn create_goal(&mut self, input: NewGoal) -> Result<Goal, GoalError> {
        validate(&input)?;

        let now = self.clock.now();
        let goal = Goal {
            id: Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            description: input.description,
            category: input.category,
            target: input.target,
            current: 0.0,
            milestones: engine::generate_milestones(input.target, &input.unit),
            unit: input.unit,
            deadline: input.deadline,
            status: GoalStatus::Active,
            created_at: now,
        };

        self.store.goals_mut().insert(0, goal.clone());
        tracing::info!(goal_id = %goal.id, title = %goal.title, "goal created");

        let saved = self.store.save();
        self.dispatcher.dispatch(&GoalEvent::goal_created(&goal, now));
        saved.map(|_| goal)
    }

    /// Set a goal's progress to `new_current` and recompute its derived state.
    ///
    /// Any number is taken as given; callers validate user input.
    pub fn update_progress(&mut self, goal_id: &str, new_current: f64) -> Result<Goal, GoalError> {
        let now = self.clock.now();
        let index = self
            .store
            .goals()
            .iter()
            .position(|g| g.id == goal_id)
            .ok_or_else(|| GoalError::NotFound(goal_id.to_string()))?;

        let before = self.store.goals()[index].clone();
        let after = engine::apply_progress(&before, new_current, now);
        self.store.goals_mut()[index] = after.clone();
        tracing::info!(
            goal_id,
            from = before.current,
            to = after.current,
            status = %after.status,
            "progress updated"
        );

        let saved = self.store.save();

        self.dispatcher.dispatch(&GoalEvent::progress_updated(
            goal_id,
            before.current,
            after.current,
            now,
        ));
        for milestone in engine::newly_completed_milestones(&before, &after) {
            self.dispatcher
                .dispatch(&GoalEvent::milestone_reached(&after, milestone, now));
        }
        if before.status != GoalStatus::Completed && after.status == GoalStatus::Completed {
            self.dispatcher
                .dispatch(&GoalEvent::goal_completed(&after, now));
        }

        saved.map(|_| after)
    }

    /// Remove the goal with `goal_id`. Returns whether a goal was removed.
    ///
    /// The collection is persisted either way.
    pub fn delete_goal(&mut self, goal_id: &str) -> Result<bool, GoalError> {
        let goals = self.store.goals_mut();
        let index = goals.iter().position(|g| g.id == goal_id);
        let removed = index.map(|index| goals.remove(index));

        match &removed {
            Some(goal) => tracing::info!(goal_id, title = %goal.title, "goal deleted"),
            None => tracing::debug!(goal_id, "delete requested for unknown goal"),
        }

        let saved = self.store.save();
        if let Some(goal) = &removed {
            self.dispatcher
                .dispatch(&GoalEvent::goal_deleted(goal, self.clock.now()));
        }
        saved.map(|_| removed.is_some())
    }

    pub fn store(&self) -> &GoalStore {
        &self.store
    }
}

fn validate(input: &NewGoal) -> Result<(), GoalError> {
    if input.title.trim().is_empty() {
        return Err(GoalError::validation("title", "must not be empty"));
    }
    if input.category.is_empty() {
        return Err(GoalError::validation("category", "must not be empty"));
    }
    if !input.target.is_finite() {
        return Err(GoalError::validation("target", "must be a finite number"));
    }
    if input.target <= 0.0 {
        return Err(GoalError::validation("target", "must be greater than zero"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FileBackend, KeyValueBackend, MemoryBackend};
    use crate::clock::FixedClock;
    use crate::events::NotificationSink;
    use crate::store::DEFAULT_STORAGE_KEY;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::{Arc, Mutex};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap()
    }

    fn controller() -> (GoalController, FixedClock) {
        let clock = FixedClock::new(now());
        let store = GoalStore::new(Box::new(MemoryBackend::new()));
        (GoalController::new(store, Box::new(clock.clone())), clock)
    }

    fn read_books() -> NewGoal {
        NewGoal::new("Read", "learning", 12.0, "books", now() + Duration::days(60))
    }

    fn stored_json(c: &GoalController) -> serde_json::Value {
        let raw = c.store().backend().get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, event: &GoalEvent) -> Result<(), GoalError> {
            self.events
                .lock()
                .unwrap()
                .push(event.event_type().to_string());
            Ok(())
        }
    }

    #[test]
    fn create_goal_builds_initial_state() {
        let (mut c, _) = controller();
        let goal = c.create_goal(read_books()).unwrap();

        assert_eq!(goal.current, 0.0);
        assert_eq!(goal.status, GoalStatus::Active);
        assert_eq!(goal.created_at, now());
        let thresholds: Vec<f64> = goal.milestones.iter().map(|m| m.target).collect();
        assert_eq!(thresholds, vec![6.0, 12.0]);
        assert_eq!(c.goals().len(), 1);
        assert_eq!(stored_json(&c)[0]["id"], goal.id.as_str());
    }

    #[test]
    fn create_goal_prepends() {
        let (mut c, _) = controller();
        let first = c.create_goal(read_books()).unwrap();
        let second = c
            .create_goal(NewGoal::new("Run", "health", 50.0, "km", now()))
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(c.goals()[0].id, second.id);
        assert_eq!(c.goals()[1].id, first.id);
        assert_eq!(stored_json(&c)[0]["title"], "Run");
    }

    #[test]
    fn create_goal_rejects_invalid_input() {
        let (mut c, _) = controller();

        let mut no_title = read_books();
        no_title.title = "   ".to_string();
        let mut no_category = read_books();
        no_category.category = "".into();
        let mut zero = read_books();
        zero.target = 0.0;
        let mut negative = read_books();
        negative.target = -3.0;
        let mut nan = read_books();
        nan.target = f64::NAN;
        let mut infinite = read_books();
        infinite.target = f64::INFINITY;

        for input in [no_title, no_category, zero, negative, nan, infinite] {
            let err = c.create_goal(input).unwrap_err();
            assert!(matches!(err, GoalError::Validation { .. }));
        }
        assert!(c.goals().is_empty());
        assert!(c.store().backend().get(DEFAULT_STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn create_goal_accepts_custom_category() {
        let (mut c, _) = controller();
        let goal = c
            .create_goal(NewGoal::new("Plant", "gardening", 3.0, "beds", now()))
            .unwrap();
        assert_eq!(goal.category.as_str(), "gardening");
    }

    #[test]
    fn update_progress_recomputes_and_persists() {
        let (mut c, _) = controller();
        let goal = c.create_goal(read_books()).unwrap();

        let updated = c.update_progress(&goal.id, 7.0).unwrap();
        assert_eq!(updated.current, 7.0);
        assert!(updated.milestones[0].completed);
        assert!(!updated.milestones[1].completed);
        assert_eq!(c.get(&goal.id).unwrap(), &updated);
        assert_eq!(stored_json(&c)[0]["current"], 7.0);
        assert_eq!(stored_json(&c)[0]["milestones"][0]["completed"], true);
    }

    #[test]
    fn update_progress_past_deadline() {
        let (mut c, clock) = controller();
        let goal = c.create_goal(read_books()).unwrap();
        clock.advance(Duration::days(61));

        assert_eq!(
            c.update_progress(&goal.id, 4.0).unwrap().status,
            GoalStatus::Overdue
        );
        assert_eq!(
            c.update_progress(&goal.id, 12.0).unwrap().status,
            GoalStatus::Completed
        );
    }

    #[test]
    fn update_progress_takes_any_number() {
        let (mut c, _) = controller();
        let goal = c.create_goal(read_books()).unwrap();
        let updated = c.update_progress(&goal.id, -5.0).unwrap();
        assert_eq!(updated.current, -5.0);
        assert_eq!(updated.status, GoalStatus::Active);
    }

    #[test]
    fn update_unknown_goal_is_not_found() {
        let (mut c, _) = controller();
        c.create_goal(read_books()).unwrap();
        let before = c.goals().to_vec();

        let err = c.update_progress("missing", 3.0).unwrap_err();
        assert!(matches!(err, GoalError::NotFound(ref id) if id == "missing"));
        assert_eq!(c.goals(), before.as_slice());
    }

    #[test]
    fn delete_last_goal_saves_empty_array() {
        let (mut c, _) = controller();
        let goal = c.create_goal(read_books()).unwrap();

        assert!(c.delete_goal(&goal.id).unwrap());
        assert!(c.goals().is_empty());
        assert_eq!(stored_json(&c), serde_json::json!([]));
    }

    #[test]
    fn delete_unknown_goal_is_a_no_op() {
        let (mut c, _) = controller();
        c.create_goal(read_books()).unwrap();
        assert!(!c.delete_goal("missing").unwrap());
        assert_eq!(c.goals().len(), 1);
    }

    #[test]
    fn save_failure_keeps_in_memory_change() {
        let clock = FixedClock::new(now());
        let store = GoalStore::new(Box::new(MemoryBackend::with_quota(4)));
        let mut c = GoalController::new(store, Box::new(clock));

        let err = c.create_goal(read_books()).unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(c.goals().len(), 1);
        assert_eq!(c.goals()[0].title, "Read");
    }

    #[test]
    fn controller_loads_existing_collection_once() {
        let mut backend = MemoryBackend::new();
        backend.insert(
            DEFAULT_STORAGE_KEY,
            r#"[{"id":"old","title":"Walk","category":"health","target":5,"current":1,
                "unit":"walks","deadline":"2026-12-01T00:00:00Z","status":"active",
                "createdAt":"2026-09-01T00:00:00Z"}]"#,
        );
        let mut c = GoalController::new(
            GoalStore::new(Box::new(backend)),
            Box::new(FixedClock::new(now())),
        );
        assert_eq!(c.goals()[0].id, "old");

        c.create_goal(read_books()).unwrap();
        assert_eq!(c.goals().len(), 2);
        assert_eq!(c.goals()[1].id, "old");
    }

    #[test]
    fn events_follow_mutations() {
        let sink = RecordingSink::default();
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_sink(Box::new(sink.clone()));

        let store = GoalStore::new(Box::new(MemoryBackend::new()));
        let mut c = GoalController::new(store, Box::new(FixedClock::new(now())))
            .with_dispatcher(dispatcher);

        let goal = c.create_goal(read_books()).unwrap();
        c.update_progress(&goal.id, 6.0).unwrap();
        c.update_progress(&goal.id, 13.0).unwrap();
        c.update_progress(&goal.id, 14.0).unwrap();
        c.delete_goal(&goal.id).unwrap();
        c.update_progress(&goal.id, 1.0).unwrap_err();

        let events = sink.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "goal_created",
                "progress_updated",
                "milestone_reached",
                "progress_updated",
                "milestone_reached",
                "goal_completed",
                "progress_updated",
                "goal_deleted",
            ]
        );
    }

    #[test]
    fn summaries_reflect_clock() {
        let (mut c, clock) = controller();
        let goal = c.create_goal(read_books()).unwrap();
        c.update_progress(&goal.id, 3.0).unwrap();

        let summary = &c.summaries()[0];
        assert_eq!(summary.progress_percent, 25.0);
        assert_eq!(summary.days_remaining, 60);

        clock.advance(Duration::days(90));
        assert_eq!(c.summaries()[0].status, GoalStatus::Overdue);
        assert_eq!(c.get(&goal.id).unwrap().status, GoalStatus::Active);
    }

    #[test]
    fn non_finite_progress_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let open = || {
            let backend = FileBackend::new(dir.path()).unwrap();
            GoalController::new(
                GoalStore::new(Box::new(backend)),
                Box::new(FixedClock::new(now())),
            )
        };

        let mut c = open();
        let nan_goal = c.create_goal(read_books()).unwrap();
        let inf_goal = c
            .create_goal(NewGoal::new("Run", "health", 50.0, "km", now()))
            .unwrap();
        c.update_progress(&nan_goal.id, f64::NAN).unwrap();
        c.update_progress(&inf_goal.id, f64::INFINITY).unwrap();

        let reopened = open();
        assert_eq!(reopened.goals().len(), 2);
        let nan_back = reopened.get(&nan_goal.id).unwrap();
        assert!(nan_back.current.is_nan());
        assert_eq!(nan_back.status, GoalStatus::Active);
        assert_eq!(nan_back.milestones.len(), 2);
        let inf_back = reopened.get(&inf_goal.id).unwrap();
        assert_eq!(inf_back.current, f64::INFINITY);
        assert_eq!(inf_back.status, GoalStatus::Completed);
    }
}
