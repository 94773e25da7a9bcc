//! Goal/habit domain model.
//!
//! # Responsibility
//! - Define the in-memory shapes exchanged between store, controller and view.
//! - Normalize user-entered names before they reach persistence.
//!
//! # Invariants
//! - A goal is identified by its `name` alone.
//! - A habit is identified by `(goal, name)`; see `HabitKey`.
//! - Uniqueness is enforced by the store, not by these types.

pub mod goal;
pub mod habit;
pub mod name;
