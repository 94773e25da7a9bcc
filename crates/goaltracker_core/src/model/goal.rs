//! Goal domain model.
//!
//! # Invariants
//! - `name` is the goal identity; equality and hashing ignore `habits`.
//! - `habits` keeps insertion order, which is also display order.

use crate::model::habit::{Habit, HabitKey};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// A named goal owning an ordered list of habits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    /// Globally unique goal name.
    pub name: String,
    /// Habits linked to this goal, in insertion order.
    #[serde(default)]
    pub habits: Vec<Habit>,
}

impl Goal {
    /// Creates a goal with no habits.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            habits: Vec::new(),
        }
    }

    /// Links `habit` to this goal and appends it.
    pub fn add_habit(&mut self, mut habit: Habit) {
        habit.goal = Some(self.name.clone());
        self.habits.push(habit);
    }

    /// Removes the habit with the same identity, returning it when present.
    ///
    /// Matching uses `(goal, name)`, so a stale counter does not prevent
    /// removal.
    pub fn remove_habit(&mut self, key: &HabitKey) -> Option<Habit> {
        let index = self.position_of(key)?;
        let mut removed = self.habits.remove(index);
        removed.goal = None;
        Some(removed)
    }

    /// Replaces the habit with the same identity, returning whether it was found.
    pub fn replace_habit(&mut self, habit: Habit) -> bool {
        let Some(key) = habit.key() else {
            return false;
        };
        match self.position_of(&key) {
            Some(index) => {
                self.habits[index] = habit;
                true
            }
            None => false,
        }
    }

    /// Looks up a habit by name.
    pub fn habit(&self, name: &str) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.name == name)
    }

    fn position_of(&self, key: &HabitKey) -> Option<usize> {
        if key.goal != self.name {
            return None;
        }
        self.habits.iter().position(|habit| habit.name == key.name)
    }
}

impl PartialEq for Goal {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Goal {}

impl Hash for Goal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Display for Goal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::Goal;
    use crate::model::habit::{Habit, HabitKey};

    #[test]
    fn equality_uses_name_only() {
        let mut with_habit = Goal::new("Fitness");
        with_habit.add_habit(Habit::new("Run"));

        assert_eq!(with_habit, Goal::new("Fitness"));
        assert_ne!(with_habit, Goal::new("Reading"));
    }

    #[test]
    fn add_habit_links_owner_and_keeps_order() {
        let mut goal = Goal::new("Fitness");
        goal.add_habit(Habit::new("Run"));
        goal.add_habit(Habit::new("Swim"));

        let names: Vec<_> = goal.habits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Run", "Swim"]);
        assert!(goal
            .habits
            .iter()
            .all(|h| h.goal.as_deref() == Some("Fitness")));
    }

    #[test]
    fn remove_habit_matches_identity_and_unlinks() {
        let mut goal = Goal::new("Fitness");
        goal.add_habit(Habit::new("Run"));

        let removed = goal
            .remove_habit(&HabitKey::new("Fitness", "Run"))
            .expect("habit should be removed");
        assert_eq!(removed.goal, None);
        assert!(goal.habits.is_empty());
        assert!(goal.remove_habit(&HabitKey::new("Other", "Run")).is_none());
    }

    #[test]
    fn replace_habit_updates_counter_in_place() {
        let mut goal = Goal::new("Fitness");
        goal.add_habit(Habit::new("Run"));
        goal.add_habit(Habit::new("Swim"));

        assert!(goal.replace_habit(Habit::linked("Fitness", "Run", 3)));
        assert_eq!(goal.habit("Run").map(|h| h.counter), Some(3));
        assert_eq!(goal.habits[0].name, "Run");
        assert!(!goal.replace_habit(Habit::new("Run")));
    }

    #[test]
    fn json_shape_lists_habits_with_owner() {
        let mut goal = Goal::new("Fitness");
        goal.add_habit(Habit::linked("Fitness", "Run", 2));

        let value = serde_json::to_value(&goal).expect("serialize goal");
        assert_eq!(
            value,
            serde_json::json!({
                "name": "Fitness",
                "habits": [{ "name": "Run", "counter": 2, "goal": "Fitness" }]
            })
        );

        let parsed: Goal = serde_json::from_str(r#"{"name":"Reading"}"#).expect("parse goal");
        assert!(parsed.habits.is_empty());
    }
}
