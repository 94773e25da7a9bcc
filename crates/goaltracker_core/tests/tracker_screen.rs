use goaltracker_core::{Action, Goal, Habit, TrackerScreen, ViewEvent};

fn goal_with_habits(name: &str, habits: &[(&str, u32)]) -> Goal {
    let mut goal = Goal::new(name);
    for (habit, counter) in habits {
        let mut habit = Habit::new(*habit);
        habit.counter = *counter;
        goal.add_habit(habit);
    }
    goal
}

fn loaded_screen() -> TrackerScreen {
    let mut screen = TrackerScreen::new();
    screen.apply(ViewEvent::ShowAllGoals(vec![
        goal_with_habits("Fitness", &[("Run", 2), ("Swim", 0)]),
        goal_with_habits("Reading", &[("Novel", 1)]),
    ]));
    screen
}

#[test]
fn fresh_screen_has_every_trigger_disabled() {
    let screen = TrackerScreen::new();
    assert!(!screen.can_add_goal());
    assert!(!screen.can_add_habit());
    assert!(!screen.can_remove_goal());
    assert!(!screen.can_remove_habit());
    assert!(!screen.can_increment());
    assert!(!screen.can_decrement());
    assert_eq!(screen.error_text(), "");
}

#[test]
fn add_goal_enabled_only_for_non_blank_input() {
    let mut screen = TrackerScreen::new();
    screen.set_goal_input("   ");
    assert!(!screen.can_add_goal());
    assert_eq!(screen.add_goal_action(), None);

    screen.set_goal_input(" Fitness ");
    assert!(screen.can_add_goal());
    assert_eq!(
        screen.add_goal_action(),
        Some(Action::NewGoal(Goal::new(" Fitness ")))
    );
}

#[test]
fn add_habit_requires_input_and_selected_goal() {
    let mut screen = loaded_screen();
    screen.set_habit_input("Walk");
    assert!(!screen.can_add_habit());

    screen.select_goal(Some(0));
    assert!(screen.can_add_habit());
    assert_eq!(
        screen.add_habit_action(),
        Some(Action::AddHabit(Goal::new("Fitness"), Habit::new("Walk")))
    );

    screen.set_habit_input(" ");
    assert!(!screen.can_add_habit());
    assert_eq!(screen.add_habit_action(), None);
}

#[test]
fn selecting_goal_shows_its_habits_and_enables_remove_goal() {
    let mut screen = loaded_screen();
    screen.select_goal(Some(1));

    assert!(screen.can_remove_goal());
    assert_eq!(screen.habits(), &[Habit::linked("Reading", "Novel", 1)]);
    assert_eq!(
        screen.remove_goal_action(),
        Some(Action::DeleteGoal(Goal::new("Reading")))
    );

    screen.select_goal(Some(9));
    assert!(!screen.can_remove_goal());
    assert!(screen.habits().is_empty());
}

#[test]
fn habit_triggers_follow_habit_selection() {
    let mut screen = loaded_screen();
    screen.select_goal(Some(0));
    assert!(!screen.can_increment());

    screen.select_habit(Some(0));
    assert!(screen.can_remove_habit());
    assert!(screen.can_increment());
    assert!(screen.can_decrement());

    let run = Habit::linked("Fitness", "Run", 2);
    assert_eq!(
        screen.increment_action(),
        Some(Action::IncrementCounter(run.clone()))
    );
    assert_eq!(
        screen.decrement_action(),
        Some(Action::DecrementCounter(run.clone()))
    );
    assert_eq!(
        screen.remove_habit_action(),
        Some(Action::RemoveHabit(Goal::new("Fitness"), run))
    );

    screen.select_goal(Some(1));
    assert!(!screen.can_remove_habit());
}

#[test]
fn show_all_goals_replaces_list_and_clears_selection() {
    let mut screen = loaded_screen();
    screen.select_goal(Some(0));

    screen.apply(ViewEvent::ShowAllGoals(vec![Goal::new("Only")]));
    assert_eq!(screen.goals(), &[Goal::new("Only")]);
    assert!(screen.selected_goal().is_none());
    assert!(screen.habits().is_empty());
}

#[test]
fn error_is_shown_then_cleared_by_next_success() {
    let mut screen = loaded_screen();
    screen.apply(ViewEvent::ShowError("The goal Fitness already exists".to_string()));
    assert!(screen.has_error());
    assert_eq!(screen.error_text(), "The goal Fitness already exists");

    screen.apply(ViewEvent::GoalAdded(Goal::new("Music")));
    assert!(!screen.has_error());
    assert_eq!(screen.error_text(), "");
    assert_eq!(screen.goals().last(), Some(&Goal::new("Music")));
}

#[test]
fn goal_removed_drops_goal_and_clears_habits() {
    let mut screen = loaded_screen();
    screen.select_goal(Some(0));
    screen.apply(ViewEvent::ShowError("stale".to_string()));

    screen.apply(ViewEvent::GoalRemoved(Goal::new("Fitness")));
    assert_eq!(screen.goals(), &[Goal::new("Reading")]);
    assert!(screen.habits().is_empty());
    assert!(screen.selected_goal().is_none());
    assert_eq!(screen.error_text(), "");
}

#[test]
fn habit_added_appends_to_selected_goal_and_survives_reselection() {
    let mut screen = loaded_screen();
    screen.select_goal(Some(1));

    screen.apply(ViewEvent::HabitAdded(Habit::linked("Reading", "Poetry", 0)));
    assert_eq!(screen.habits().len(), 2);
    assert_eq!(screen.habits()[1].name, "Poetry");

    screen.select_goal(Some(0));
    screen.select_goal(Some(1));
    assert_eq!(screen.habits().len(), 2);
}

#[test]
fn habit_removed_matches_identity_even_with_stale_counter() {
    let mut screen = loaded_screen();
    screen.select_goal(Some(0));
    screen.select_habit(Some(1));

    screen.apply(ViewEvent::HabitRemoved(Habit::linked("Fitness", "Run", 99)));
    assert_eq!(screen.habits(), &[Habit::linked("Fitness", "Swim", 0)]);
    assert_eq!(screen.selected_habit().map(|h| h.name.as_str()), Some("Swim"));
    assert_eq!(screen.goals()[0].habits.len(), 1);
}

#[test]
fn counter_updated_refreshes_display_and_owning_goal() {
    let mut screen = loaded_screen();
    screen.select_goal(Some(0));
    screen.select_habit(Some(0));

    screen.apply(ViewEvent::CounterUpdated(Habit::linked("Fitness", "Run", 3)));
    assert_eq!(screen.habits()[0].counter, 3);
    assert_eq!(screen.selected_habit().map(|h| h.counter), Some(3));
    assert_eq!(screen.goals()[0].habit("Run").map(|h| h.counter), Some(3));
}
