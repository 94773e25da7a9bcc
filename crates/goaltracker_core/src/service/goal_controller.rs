//! Goal tracker controller.
//!
//! # Responsibility
//! - Run one store operation per user intent.
//! - Report the outcome through exactly one `GoalView` callback.
//!
//! # Invariants
//! - Domain failures become `show_error` and never a success notification.
//! - Decrementing a zero counter is refused before the store is touched.
//! - Infrastructure failures are logged and returned to the caller.

use crate::model::goal::Goal;
use crate::model::habit::Habit;
use crate::repo::goal_repo::{GoalRepository, StoreError, StoreResult};
use crate::view::GoalView;
use log::error;

/// Message shown when a decrement is attempted on a zero counter.
pub const ZERO_COUNTER_MESSAGE: &str = "You can't decrement a counter equal to zero!";

/// One user intent, as raised by a front-end trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AllGoals,
    NewGoal(Goal),
    DeleteGoal(Goal),
    AddHabit(Goal, Habit),
    RemoveHabit(Goal, Habit),
    IncrementCounter(Habit),
    DecrementCounter(Habit),
}

impl Action {
    /// Short stable label used in log events.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AllGoals => "all_goals",
            Self::NewGoal(_) => "new_goal",
            Self::DeleteGoal(_) => "delete_goal",
            Self::AddHabit(..) => "add_habit",
            Self::RemoveHabit(..) => "remove_habit",
            Self::IncrementCounter(_) => "increment_counter",
            Self::DecrementCounter(_) => "decrement_counter",
        }
    }
}

/// Stateless mediator between a store and a view.
pub struct GoalController<R: GoalRepository, V: GoalView> {
    repo: R,
    view: V,
}

impl<R: GoalRepository, V: GoalView> GoalController<R, V> {
    pub fn new(repo: R, view: V) -> Self {
        Self { repo, view }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Runs the controller method matching `action`.
    pub fn handle(&self, action: Action) -> StoreResult<()> {
        match action {
            Action::AllGoals => self.all_goals(),
            Action::NewGoal(goal) => self.new_goal(goal),
            Action::DeleteGoal(goal) => self.delete_goal(goal),
            Action::AddHabit(goal, habit) => self.add_habit(&goal, habit),
            Action::RemoveHabit(goal, habit) => self.remove_habit(&goal, habit),
            Action::IncrementCounter(habit) => self.increment_counter(habit),
            Action::DecrementCounter(habit) => self.decrement_counter(habit),
        }
    }

    /// Shows every stored goal. Has no domain failure path.
    pub fn all_goals(&self) -> StoreResult<()> {
        let goals = self.infra("all_goals", self.repo.find_all_goals())?;
        self.view.show_all_goals(goals);
        Ok(())
    }

    pub fn new_goal(&self, goal: Goal) -> StoreResult<()> {
        if let Some(stored) = self.settle("new_goal", self.repo.add_goal(&goal))? {
            self.view.goal_added(stored);
        }
        Ok(())
    }

    pub fn delete_goal(&self, goal: Goal) -> StoreResult<()> {
        if self
            .settle("delete_goal", self.repo.delete_goal(&goal))?
            .is_some()
        {
            self.view.goal_removed(goal);
        }
        Ok(())
    }

    pub fn add_habit(&self, goal: &Goal, habit: Habit) -> StoreResult<()> {
        if let Some(linked) = self.settle("add_habit", self.repo.add_habit_to_goal(goal, &habit))? {
            self.view.habit_added(linked);
        }
        Ok(())
    }

    pub fn remove_habit(&self, goal: &Goal, habit: Habit) -> StoreResult<()> {
        if self
            .settle(
                "remove_habit",
                self.repo.remove_habit_from_goal(goal, &habit),
            )?
            .is_some()
        {
            self.view.habit_removed(habit);
        }
        Ok(())
    }

    pub fn increment_counter(&self, habit: Habit) -> StoreResult<()> {
        if let Some(updated) = self.settle("increment_counter", self.repo.increment_counter(&habit))? {
            self.view.counter_updated(updated);
        }
        Ok(())
    }

    pub fn decrement_counter(&self, habit: Habit) -> StoreResult<()> {
        if habit.counter == 0 {
            self.view.show_error(ZERO_COUNTER_MESSAGE);
            return Ok(());
        }
        if let Some(updated) = self.settle("decrement_counter", self.repo.decrement_counter(&habit))? {
            self.view.counter_updated(updated);
        }
        Ok(())
    }

    /// Shows domain failures and yields `None`; propagates everything else.
    fn settle<T>(&self, action: &'static str, result: StoreResult<T>) -> StoreResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_domain_failure() => {
                self.view.show_error(&err.to_string());
                Ok(None)
            }
            Err(err) => Err(log_infra_failure(action, err)),
        }
    }

    fn infra<T>(&self, action: &'static str, result: StoreResult<T>) -> StoreResult<T> {
        result.map_err(|err| log_infra_failure(action, err))
    }
}

fn log_infra_failure(action: &'static str, err: StoreError) -> StoreError {
    error!(
        "event=controller_action module=service status=error action={action} error={err}"
    );
    err
}
