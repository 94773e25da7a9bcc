//! Habit domain model.
//!
//! # Invariants
//! - `counter` never goes below zero; the store schema enforces it and the
//!   controller refuses to decrement a zero counter.
//! - Identity is `(goal, name)` (`HabitKey`).
//! - Equality compares `name`, `counter` and `goal`, so two snapshots of the
//!   same habit with different counters are not equal. Use `key()` when the
//!   comparison is about identity.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A counted habit, optionally linked to its owning goal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Habit {
    /// Habit name, unique within its goal.
    pub name: String,
    /// Number of times the habit was performed.
    pub counter: u32,
    /// Owning goal name. `None` until the habit is added to a goal.
    pub goal: Option<String>,
}

/// Composite identity of a persisted habit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HabitKey {
    pub goal: String,
    pub name: String,
}

impl HabitKey {
    pub fn new(goal: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            name: name.into(),
        }
    }
}

impl Habit {
    /// Creates an unlinked habit with counter `0`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            counter: 0,
            goal: None,
        }
    }

    /// Creates a habit already linked to `goal`.
    pub fn linked(goal: impl Into<String>, name: impl Into<String>, counter: u32) -> Self {
        Self {
            name: name.into(),
            counter,
            goal: Some(goal.into()),
        }
    }

    /// Returns the persisted identity, or `None` for an unlinked habit.
    pub fn key(&self) -> Option<HabitKey> {
        self.goal
            .as_ref()
            .map(|goal| HabitKey::new(goal.clone(), self.name.clone()))
    }

    /// Returns whether both habits refer to the same persisted row.
    pub fn same_identity(&self, other: &Habit) -> bool {
        self.goal.is_some() && self.goal == other.goal && self.name == other.name
    }
}

impl Display for Habit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.counter)
    }
}
