//! Repository layer: the goal/habit entity store.
//!
//! # Responsibility
//! - Define the store contract consumed by the controller.
//! - Isolate SQLite query and transaction details from the layers above.
//!
//! # Invariants
//! - Repository APIs return semantic failures (`DuplicateGoal`,
//!   `HabitNotFound`, ...) in addition to DB transport errors.

pub mod goal_repo;
