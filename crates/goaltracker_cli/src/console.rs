//! Line-oriented console front-end.
//!
//! Parses one command per line and renders a `TrackerScreen` as text.

use goaltracker_core::TrackerScreen;
use std::fmt::Write;

pub const HELP: &str = "\
commands:
  list [--json]        show goals (as JSON with --json)
  add-goal <name>      add a goal
  select-goal <n>      select goal number n (0 clears)
  remove-goal          remove the selected goal
  add-habit <name>     add a habit to the selected goal
  select-habit <n>     select habit number n (0 clears)
  remove-habit         remove the selected habit
  inc | dec            increment / decrement the selected habit
  reload               reload goals from storage
  help                 show this text
  quit                 exit";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List { json: bool },
    AddGoal(String),
    SelectGoal(Option<usize>),
    RemoveGoal,
    AddHabit(String),
    SelectHabit(Option<usize>),
    RemoveHabit,
    Increment,
    Decrement,
    Reload,
    Help,
    Quit,
}

/// Parses a console line. Empty lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "list" | "ls" => match rest {
            "" => Command::List { json: false },
            "--json" => Command::List { json: true },
            other => return Err(format!("unexpected argument `{other}` for list")),
        },
        "add-goal" => Command::AddGoal(rest.to_string()),
        "select-goal" => Command::SelectGoal(parse_position(rest)?),
        "remove-goal" => Command::RemoveGoal,
        "add-habit" => Command::AddHabit(rest.to_string()),
        "select-habit" => Command::SelectHabit(parse_position(rest)?),
        "remove-habit" => Command::RemoveHabit,
        "inc" | "+" => Command::Increment,
        "dec" | "-" => Command::Decrement,
        "reload" => Command::Reload,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command `{other}`; try `help`")),
    };
    Ok(Some(command))
}

/// Converts a 1-based position into an index; `0` clears the selection.
fn parse_position(raw: &str) -> Result<Option<usize>, String> {
    let position: usize = raw
        .parse()
        .map_err(|_| format!("expected a number, got `{raw}`"))?;
    Ok(position.checked_sub(1))
}

/// Renders goals, habits of the selected goal and the error line.
pub fn render(screen: &TrackerScreen) -> String {
    let mut out = String::new();
    let selected_goal = screen.selected_goal();
    let selected_habit = screen.selected_habit();

    let _ = writeln!(out, "Goals:");
    if screen.goals().is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for (index, goal) in screen.goals().iter().enumerate() {
        let marker = if selected_goal == Some(goal) { ">" } else { " " };
        let _ = writeln!(out, "{marker} {}. {goal}", index + 1);
    }

    if let Some(goal) = selected_goal {
        let _ = writeln!(out, "Habits of {goal}:");
        if screen.habits().is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for (index, habit) in screen.habits().iter().enumerate() {
            let marker = if selected_habit.is_some_and(|selected| selected.same_identity(habit)) {
                ">"
            } else {
                " "
            };
            let _ = writeln!(out, "{marker} {}. {habit}", index + 1);
        }
    }

    if screen.has_error() {
        let _ = writeln!(out, "Error: {}", screen.error_text());
    }
    out
}
