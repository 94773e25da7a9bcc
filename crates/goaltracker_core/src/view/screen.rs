//! Presentation state of the tracker window.
//!
//! `TrackerScreen` is what a front-end renders: the goal list, the habit list
//! of the selected goal, two text inputs, selections and one error line. It
//! applies `ViewEvent`s and decides which triggers are enabled.
//!
//! # Invariants
//! - `habits` always mirrors the selected goal's habits.
//! - Selections always index into the current lists.
//! - Intent builders return an action only when the trigger is enabled.

use crate::model::goal::Goal;
use crate::model::habit::{Habit, HabitKey};
use crate::model::name::is_blank;
use crate::service::goal_controller::Action;
use crate::view::ViewEvent;

/// Widget-independent window state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerScreen {
    goals: Vec<Goal>,
    habits: Vec<Habit>,
    selected_goal: Option<usize>,
    selected_habit: Option<usize>,
    goal_input: String,
    habit_input: String,
    error: Option<String>,
}

impl TrackerScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Habits of the selected goal, in display order.
    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn selected_goal(&self) -> Option<&Goal> {
        self.selected_goal.and_then(|index| self.goals.get(index))
    }

    pub fn selected_habit(&self) -> Option<&Habit> {
        self.selected_habit.and_then(|index| self.habits.get(index))
    }

    /// Current error text, or `""` when no error is shown.
    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or("")
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn set_goal_input(&mut self, text: impl Into<String>) {
        self.goal_input = text.into();
    }

    pub fn set_habit_input(&mut self, text: impl Into<String>) {
        self.habit_input = text.into();
    }

    /// Selects a goal by index (or clears the selection) and shows its habits.
    ///
    /// Out-of-range indexes clear the selection.
    pub fn select_goal(&mut self, index: Option<usize>) {
        self.selected_goal = index.filter(|&index| index < self.goals.len());
        self.selected_habit = None;
        self.habits = self
            .selected_goal()
            .map(|goal| goal.habits.clone())
            .unwrap_or_default();
    }

    /// Selects a habit of the selected goal by index.
    pub fn select_habit(&mut self, index: Option<usize>) {
        self.selected_habit = index.filter(|&index| index < self.habits.len());
    }

    pub fn can_add_goal(&self) -> bool {
        !is_blank(&self.goal_input)
    }

    pub fn can_add_habit(&self) -> bool {
        !is_blank(&self.habit_input) && self.selected_goal().is_some()
    }

    pub fn can_remove_goal(&self) -> bool {
        self.selected_goal().is_some()
    }

    pub fn can_remove_habit(&self) -> bool {
        self.selected_habit().is_some()
    }

    pub fn can_increment(&self) -> bool {
        self.selected_habit().is_some()
    }

    pub fn can_decrement(&self) -> bool {
        self.selected_habit().is_some()
    }

    pub fn add_goal_action(&self) -> Option<Action> {
        self.can_add_goal()
            .then(|| Action::NewGoal(Goal::new(self.goal_input.clone())))
    }

    pub fn remove_goal_action(&self) -> Option<Action> {
        self.selected_goal()
            .map(|goal| Action::DeleteGoal(goal.clone()))
    }

    pub fn add_habit_action(&self) -> Option<Action> {
        if !self.can_add_habit() {
            return None;
        }
        self.selected_goal()
            .map(|goal| Action::AddHabit(goal.clone(), Habit::new(self.habit_input.clone())))
    }

    pub fn remove_habit_action(&self) -> Option<Action> {
        let goal = self.selected_goal()?;
        let habit = self.selected_habit()?;
        Some(Action::RemoveHabit(goal.clone(), habit.clone()))
    }

    pub fn increment_action(&self) -> Option<Action> {
        self.selected_habit()
            .map(|habit| Action::IncrementCounter(habit.clone()))
    }

    pub fn decrement_action(&self) -> Option<Action> {
        self.selected_habit()
            .map(|habit| Action::DecrementCounter(habit.clone()))
    }

    /// Applies one controller notification.
    pub fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::ShowAllGoals(goals) => {
                self.goals = goals;
                self.select_goal(None);
            }
            ViewEvent::ShowError(message) => self.error = Some(message),
            ViewEvent::GoalAdded(goal) => {
                self.goals.push(goal);
                self.error = None;
            }
            ViewEvent::GoalRemoved(goal) => {
                self.goals.retain(|shown| shown != &goal);
                self.select_goal(None);
                self.error = None;
            }
            ViewEvent::HabitAdded(habit) => {
                self.on_habit_added(habit);
                self.error = None;
            }
            ViewEvent::HabitRemoved(habit) => {
                self.on_habit_removed(&habit);
                self.error = None;
            }
            ViewEvent::CounterUpdated(habit) => {
                self.on_counter_updated(habit);
                self.error = None;
            }
        }
    }

    fn on_habit_added(&mut self, habit: Habit) {
        let Some(owner) = self.goal_index(habit.goal.as_deref()) else {
            return;
        };
        self.goals[owner].habits.push(habit.clone());
        if self.selected_goal == Some(owner) {
            self.habits.push(habit);
        }
    }

    fn on_habit_removed(&mut self, habit: &Habit) {
        let Some(key) = habit.key() else {
            return;
        };
        if let Some(owner) = self.goal_index(Some(&key.goal)) {
            self.goals[owner].remove_habit(&key);
        }

        let selected_key = self.selected_habit().and_then(Habit::key);
        self.habits.retain(|shown| shown.key().as_ref() != Some(&key));
        self.selected_habit = selected_key
            .filter(|selected| selected != &key)
            .and_then(|selected| self.position_of_habit(&selected));
    }

    fn on_counter_updated(&mut self, habit: Habit) {
        let Some(key) = habit.key() else {
            return;
        };
        if let Some(owner) = self.goal_index(Some(&key.goal)) {
            self.goals[owner].replace_habit(habit.clone());
        }
        if let Some(index) = self.position_of_habit(&key) {
            self.habits[index] = habit;
        }
    }

    fn goal_index(&self, name: Option<&str>) -> Option<usize> {
        let name = name?;
        self.goals.iter().position(|goal| goal.name == name)
    }

    fn position_of_habit(&self, key: &HabitKey) -> Option<usize> {
        self.habits
            .iter()
            .position(|shown| shown.key().as_ref() == Some(key))
    }
}
