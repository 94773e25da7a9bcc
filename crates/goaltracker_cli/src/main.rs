//! Console front-end for the goal tracker.
//!
//! # Responsibility
//! - Resolve configuration, logging and the selected persistence unit.
//! - Drive a `TrackerScreen` from stdin on the main (presentation) thread.
//! - Hand every intent to the dispatcher and render the resulting events.

mod console;

use anyhow::{bail, Context};
use clap::Parser;
use console::{parse_command, render, Command, HELP};
use goaltracker_core::db::open_persistence_unit;
use goaltracker_core::{
    init_logging, presentation_channel, Action, ActionDispatcher, DispatchError, GoalController,
    PresentationInbox, SqliteGoalRepository, TrackerConfig, TrackerScreen,
    DEFAULT_PERSISTENCE_UNIT,
};
use log::{info, warn};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const EVENT_WAIT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "goaltracker")]
#[command(about = "Track goals and the habits that lead to them", version)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Named persistence unit from the configuration
    #[arg(long, default_value = DEFAULT_PERSISTENCE_UNIT)]
    persistence_unit: String,

    /// Overrides `[logging].level`
    #[arg(long)]
    log_level: Option<String>,

    /// Data directory for the built-in `default` unit
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::builtin(resolve_data_dir(cli.data_dir.clone())?),
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, config.logging.effective_dir()).context("failed to start logging")?;

    let unit = config.persistence_unit(&cli.persistence_unit)?;
    let conn = open_persistence_unit(&unit)
        .with_context(|| format!("failed to open persistence unit `{}`", unit.name))?;
    let repo = SqliteGoalRepository::try_new(conn)?;
    info!(
        "event=cli_start module=cli status=ok persistence_unit={}",
        unit.name
    );

    let (view, inbox) = presentation_channel();
    let controller = Arc::new(GoalController::new(repo, view));
    let dispatcher = ActionDispatcher::start(controller, config.dispatch)?;

    let mut screen = TrackerScreen::new();
    submit_and_wait(&dispatcher, &inbox, &mut screen, Action::AllGoals)?;
    print!("{}", render(&screen));

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        inbox.drain_into(&mut screen);
        write!(stdout, "> ")?;
        stdout.flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let command = match parse_command(&line?) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        let action = match command {
            Command::Quit => break,
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::List { json: true } => {
                println!("{}", serde_json::to_string_pretty(screen.goals())?);
                continue;
            }
            Command::List { json: false } => {
                print!("{}", render(&screen));
                continue;
            }
            Command::SelectGoal(index) => {
                screen.select_goal(index);
                print!("{}", render(&screen));
                continue;
            }
            Command::SelectHabit(index) => {
                screen.select_habit(index);
                print!("{}", render(&screen));
                continue;
            }
            Command::Reload => Some(Action::AllGoals),
            Command::AddGoal(name) => {
                screen.set_goal_input(name);
                screen.add_goal_action()
            }
            Command::AddHabit(name) => {
                screen.set_habit_input(name);
                screen.add_habit_action()
            }
            Command::RemoveGoal => screen.remove_goal_action(),
            Command::RemoveHabit => screen.remove_habit_action(),
            Command::Increment => screen.increment_action(),
            Command::Decrement => screen.decrement_action(),
        };

        match action {
            Some(action) => {
                submit_and_wait(&dispatcher, &inbox, &mut screen, action)?;
                print!("{}", render(&screen));
            }
            None => println!("disabled: nothing selected or empty name"),
        }
    }

    dispatcher.shutdown();
    info!("event=cli_stop module=cli status=ok");
    Ok(())
}

/// Submits `action` and applies the single event it produces.
fn submit_and_wait(
    dispatcher: &ActionDispatcher,
    inbox: &PresentationInbox,
    screen: &mut TrackerScreen,
    action: Action,
) -> anyhow::Result<()> {
    match dispatcher.submit(action) {
        Ok(()) => {}
        Err(err @ DispatchError::QueueFull(_)) => {
            warn!("event=cli_submit module=cli status=error error={err}");
            println!("busy: {err}");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    }
    if inbox.wait_into(screen, 1, EVENT_WAIT) == 0 {
        warn!("event=cli_wait module=cli status=timeout");
        println!("no response from storage; see the log file");
    }
    Ok(())
}

fn resolve_data_dir(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    let Some(dirs) = directories::ProjectDirs::from("", "", "goaltracker") else {
        bail!("could not determine a data directory; pass --data-dir");
    };
    Ok(dirs.data_dir().to_path_buf())
}
