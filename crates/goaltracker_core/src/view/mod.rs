//! View contract consumed by the controller.
//!
//! # Responsibility
//! - Define the notifications a front-end must react to.
//! - Carry notifications from worker threads to the single presentation
//!   thread as `ViewEvent` values.
//!
//! # Invariants
//! - Display state is only mutated where a `PresentationInbox` is drained.
//! - Events are delivered in the order each worker produced them.

use crate::model::goal::Goal;
use crate::model::habit::Habit;
use log::warn;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

pub mod screen;

/// Notifications sent by the controller.
///
/// Implementations may be called from any dispatcher worker.
pub trait GoalView: Send + Sync {
    /// Replace the displayed goals with exactly `goals`, in order.
    fn show_all_goals(&self, goals: Vec<Goal>);
    /// Display `message` as the current error text.
    fn show_error(&self, message: &str);
    /// Append `goal` and clear the error text.
    fn goal_added(&self, goal: Goal);
    /// Remove `goal`, clear the habit display and the error text.
    fn goal_removed(&self, goal: Goal);
    /// Append `habit` to the displayed habits and clear the error text.
    fn habit_added(&self, habit: Habit);
    /// Remove `habit` from the displayed habits and clear the error text.
    fn habit_removed(&self, habit: Habit);
    /// Refresh the displayed entry for `habit` and clear the error text.
    fn counter_updated(&self, habit: Habit);
}

/// Value form of one `GoalView` callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    ShowAllGoals(Vec<Goal>),
    ShowError(String),
    GoalAdded(Goal),
    GoalRemoved(Goal),
    HabitAdded(Habit),
    HabitRemoved(Habit),
    CounterUpdated(Habit),
}

impl ViewEvent {
    /// Replays this event onto any `GoalView`.
    pub fn replay(self, view: &dyn GoalView) {
        match self {
            Self::ShowAllGoals(goals) => view.show_all_goals(goals),
            Self::ShowError(message) => view.show_error(&message),
            Self::GoalAdded(goal) => view.goal_added(goal),
            Self::GoalRemoved(goal) => view.goal_removed(goal),
            Self::HabitAdded(habit) => view.habit_added(habit),
            Self::HabitRemoved(habit) => view.habit_removed(habit),
            Self::CounterUpdated(habit) => view.counter_updated(habit),
        }
    }
}

/// `GoalView` that posts every callback to a `PresentationInbox`.
#[derive(Debug, Clone)]
pub struct ChannelView {
    tx: Sender<ViewEvent>,
}

impl ChannelView {
    fn post(&self, event: ViewEvent) {
        if self.tx.send(event).is_err() {
            warn!("event=view_post module=view status=error error_code=presentation_closed");
        }
    }
}

impl GoalView for ChannelView {
    fn show_all_goals(&self, goals: Vec<Goal>) {
        self.post(ViewEvent::ShowAllGoals(goals));
    }

    fn show_error(&self, message: &str) {
        self.post(ViewEvent::ShowError(message.to_string()));
    }

    fn goal_added(&self, goal: Goal) {
        self.post(ViewEvent::GoalAdded(goal));
    }

    fn goal_removed(&self, goal: Goal) {
        self.post(ViewEvent::GoalRemoved(goal));
    }

    fn habit_added(&self, habit: Habit) {
        self.post(ViewEvent::HabitAdded(habit));
    }

    fn habit_removed(&self, habit: Habit) {
        self.post(ViewEvent::HabitRemoved(habit));
    }

    fn counter_updated(&self, habit: Habit) {
        self.post(ViewEvent::CounterUpdated(habit));
    }
}

/// Receiving end owned by the presentation thread.
#[derive(Debug)]
pub struct PresentationInbox {
    rx: Receiver<ViewEvent>,
}

impl PresentationInbox {
    /// Applies every pending event to `screen` without blocking.
    ///
    /// Returns the number of applied events.
    pub fn drain_into(&self, screen: &mut screen::TrackerScreen) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            screen.apply(event);
            applied += 1;
        }
        applied
    }

    /// Waits until `count` events were applied to `screen` or `timeout` elapses.
    ///
    /// Returns the number of applied events, which is below `count` on timeout
    /// or when every `ChannelView` was dropped.
    pub fn wait_into(
        &self,
        screen: &mut screen::TrackerScreen,
        count: usize,
        timeout: Duration,
    ) -> usize {
        let deadline = Instant::now() + timeout;
        let mut applied = 0;
        while applied < count {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(event) => {
                    screen.apply(event);
                    applied += 1;
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        applied
    }

    /// Takes the next event, waiting at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ViewEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}

/// Creates a connected `ChannelView` / `PresentationInbox` pair.
pub fn presentation_channel() -> (ChannelView, PresentationInbox) {
    let (tx, rx) = mpsc::channel();
    (ChannelView { tx }, PresentationInbox { rx })
}

#[cfg(test)]
mod tests {
    use super::{presentation_channel, GoalView, ViewEvent};
    use crate::model::goal::Goal;
    use crate::model::habit::Habit;
    use std::time::Duration;

    #[test]
    fn channel_view_posts_events_in_call_order() {
        let (view, inbox) = presentation_channel();
        view.goal_added(Goal::new("First"));
        view.show_error("boom");
        view.counter_updated(Habit::linked("First", "H", 1));

        let received: Vec<_> = std::iter::from_fn(|| inbox.recv_timeout(Duration::ZERO)).collect();
        assert_eq!(
            received,
            vec![
                ViewEvent::GoalAdded(Goal::new("First")),
                ViewEvent::ShowError("boom".to_string()),
                ViewEvent::CounterUpdated(Habit::linked("First", "H", 1)),
            ]
        );
    }

    #[test]
    fn posting_after_inbox_drop_does_not_panic() {
        let (view, inbox) = presentation_channel();
        drop(inbox);
        view.show_error("nobody listens");
    }
}
