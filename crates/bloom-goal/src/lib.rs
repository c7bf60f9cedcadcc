//! # bloom-goal
//!
//! Goal tracking core for Bloom: goals with a numeric target, milestones
//! derived from that target, and a status derived from progress and deadline.
//!
//! ## Key components
//!
//! - [`Goal`] / [`Milestone`] — the persisted data model
//! - [`engine`] — pure computations (milestones, status, progress, days left)
//! - [`GoalStore`] — owns the collection and round-trips it through a
//!   [`KeyValueBackend`] ([`MemoryBackend`], [`FileBackend`])
//! - [`GoalController`] — create / update progress / delete, one persisted
//!   write per action
//! - [`GoalEvent`] / [`EventDispatcher`] — notifications for created goals,
//!   reached milestones, completed and deleted goals
//! - [`Clock`] — injectable time source

pub mod backend;
pub mod clock;
pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod goal;
pub mod store;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use clock::{Clock, FixedClock, SystemClock};
pub use controller::GoalController;
pub use engine::GoalSummary;
pub use error::GoalError;
pub use events::{EventDispatcher, GoalEvent, LogSink, NotificationSink, TracingSink};
pub use goal::{Goal, GoalCategory, GoalStatus, Milestone, NewGoal};
pub use store::{GoalStore, DEFAULT_STORAGE_KEY};
