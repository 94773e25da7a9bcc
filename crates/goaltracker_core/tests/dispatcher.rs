use goaltracker_core::db::open_db_in_memory;
use goaltracker_core::{
    presentation_channel, Action, ActionDispatcher, ChannelView, DispatchError, DispatchSettings,
    Goal, GoalController, GoalRepository, Habit, SqliteGoalRepository, StoreResult,
    TrackerScreen, ViewEvent,
};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn start(
    settings: DispatchSettings,
) -> (
    ActionDispatcher,
    goaltracker_core::PresentationInbox,
) {
    let repo = SqliteGoalRepository::try_new(open_db_in_memory().unwrap()).unwrap();
    let (view, inbox) = presentation_channel();
    let controller = Arc::new(GoalController::new(repo, view));
    (ActionDispatcher::start(controller, settings).unwrap(), inbox)
}

fn single_worker() -> DispatchSettings {
    DispatchSettings {
        workers: 1,
        queue_capacity: 16,
    }
}

#[test]
fn actions_complete_on_workers_and_update_the_screen() {
    let (dispatcher, inbox) = start(single_worker());
    let mut screen = TrackerScreen::new();

    dispatcher.submit(Action::AllGoals).unwrap();
    assert_eq!(inbox.wait_into(&mut screen, 1, WAIT), 1);
    assert!(screen.goals().is_empty());

    screen.set_goal_input("First");
    dispatcher.submit(screen.add_goal_action().unwrap()).unwrap();
    assert_eq!(inbox.wait_into(&mut screen, 1, WAIT), 1);
    assert_eq!(screen.goals(), &[Goal::new("First")]);

    screen.select_goal(Some(0));
    screen.set_habit_input("H");
    dispatcher.submit(screen.add_habit_action().unwrap()).unwrap();
    assert_eq!(inbox.wait_into(&mut screen, 1, WAIT), 1);
    assert_eq!(screen.habits(), &[Habit::linked("First", "H", 0)]);

    screen.select_habit(Some(0));
    dispatcher.submit(screen.increment_action().unwrap()).unwrap();
    assert_eq!(inbox.wait_into(&mut screen, 1, WAIT), 1);
    assert_eq!(screen.habits()[0].counter, 1);

    dispatcher.shutdown();
}

#[test]
fn domain_failures_arrive_as_error_text() {
    let (dispatcher, inbox) = start(single_worker());
    let mut screen = TrackerScreen::new();

    dispatcher.submit(Action::NewGoal(Goal::new("Dup"))).unwrap();
    dispatcher.submit(Action::NewGoal(Goal::new("Dup"))).unwrap();
    dispatcher
        .submit(Action::DecrementCounter(Habit::linked("Dup", "H", 0)))
        .unwrap();
    assert_eq!(inbox.wait_into(&mut screen, 3, WAIT), 3);

    assert_eq!(screen.goals(), &[Goal::new("Dup")]);
    assert_eq!(
        screen.error_text(),
        "You can't decrement a counter equal to zero!"
    );
}

#[test]
fn shutdown_finishes_queued_actions_and_rejects_new_ones() {
    let (dispatcher, inbox) = start(DispatchSettings {
        workers: 2,
        queue_capacity: 32,
    });
    for index in 0..10 {
        dispatcher
            .submit(Action::NewGoal(Goal::new(format!("Goal {index}"))))
            .unwrap();
    }
    dispatcher.shutdown();

    let mut screen = TrackerScreen::new();
    assert_eq!(inbox.drain_into(&mut screen), 10);
    assert_eq!(screen.goals().len(), 10);
}

/// Repository whose `find_all_goals` blocks until released.
struct GatedRepository {
    inner: SqliteGoalRepository,
    gate: Arc<(Mutex<bool>, Condvar)>,
}

impl GatedRepository {
    fn wait_for_gate(&self) {
        let (open, signal) = &*self.gate;
        let mut open = open.lock().unwrap();
        while !*open {
            open = signal.wait(open).unwrap();
        }
    }
}

impl GoalRepository for GatedRepository {
    fn find_all_goals(&self) -> StoreResult<Vec<Goal>> {
        self.wait_for_gate();
        self.inner.find_all_goals()
    }

    fn find_goal_by_name(&self, name: &str) -> StoreResult<Option<Goal>> {
        self.inner.find_goal_by_name(name)
    }

    fn add_goal(&self, goal: &Goal) -> StoreResult<Goal> {
        self.inner.add_goal(goal)
    }

    fn delete_goal(&self, goal: &Goal) -> StoreResult<()> {
        self.inner.delete_goal(goal)
    }

    fn add_habit_to_goal(&self, goal: &Goal, habit: &Habit) -> StoreResult<Habit> {
        self.inner.add_habit_to_goal(goal, habit)
    }

    fn remove_habit_from_goal(&self, goal: &Goal, habit: &Habit) -> StoreResult<()> {
        self.inner.remove_habit_from_goal(goal, habit)
    }

    fn increment_counter(&self, habit: &Habit) -> StoreResult<Habit> {
        self.inner.increment_counter(habit)
    }

    fn decrement_counter(&self, habit: &Habit) -> StoreResult<Habit> {
        self.inner.decrement_counter(habit)
    }
}

#[test]
fn full_queue_rejects_without_blocking() {
    let gate = Arc::new((Mutex::new(false), Condvar::new()));
    let repo = GatedRepository {
        inner: SqliteGoalRepository::try_new(open_db_in_memory().unwrap()).unwrap(),
        gate: Arc::clone(&gate),
    };
    let (view, inbox): (ChannelView, _) = presentation_channel();
    let controller = Arc::new(GoalController::new(repo, view));
    let dispatcher = ActionDispatcher::start(
        controller,
        DispatchSettings {
            workers: 1,
            queue_capacity: 1,
        },
    )
    .unwrap();

    // The worker takes the first action and blocks on the gate; the second
    // fills the single queue slot.
    dispatcher.submit(Action::AllGoals).unwrap();
    let mut accepted = 1;
    let rejected = loop {
        match dispatcher.submit(Action::AllGoals) {
            Ok(()) => accepted += 1,
            Err(err) => break err,
        }
        assert!(accepted <= 2, "queue accepted more than its capacity");
    };
    assert!(matches!(rejected, DispatchError::QueueFull(Action::AllGoals)));

    {
        let (open, signal) = &*gate;
        *open.lock().unwrap() = true;
        signal.notify_all();
    }
    dispatcher.shutdown();

    let delivered: Vec<_> = std::iter::from_fn(|| inbox.recv_timeout(Duration::ZERO)).collect();
    assert_eq!(delivered.len(), accepted);
    assert!(delivered
        .iter()
        .all(|event| matches!(event, ViewEvent::ShowAllGoals(goals) if goals.is_empty())));
}

#[test]
fn zero_workers_is_rejected() {
    let repo = SqliteGoalRepository::try_new(open_db_in_memory().unwrap()).unwrap();
    let (view, _inbox) = presentation_channel();
    let controller = Arc::new(GoalController::new(repo, view));

    let result = ActionDispatcher::start(
        controller,
        DispatchSettings {
            workers: 0,
            queue_capacity: 4,
        },
    );
    assert!(matches!(result, Err(DispatchError::InvalidSettings(_))));
}
