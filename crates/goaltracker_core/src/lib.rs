//! Core domain logic for the goal tracker.
//! This crate owns the goal/habit store, the controller and the view contract.

pub mod config;
pub mod db;
pub mod dispatch;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod view;

pub use config::{
    ConfigError, DispatchSettings, LoggingSettings, PersistenceUnit, StorageTarget, TrackerConfig,
    DEFAULT_PERSISTENCE_UNIT,
};
pub use dispatch::{ActionDispatcher, DispatchError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::goal::Goal;
pub use model::habit::{Habit, HabitKey};
pub use model::name::ModelValidationError;
pub use repo::goal_repo::{GoalRepository, SqliteGoalRepository, StoreError, StoreResult};
pub use service::goal_controller::{Action, GoalController, ZERO_COUNTER_MESSAGE};
pub use view::screen::TrackerScreen;
pub use view::{presentation_channel, ChannelView, GoalView, PresentationInbox, ViewEvent};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
