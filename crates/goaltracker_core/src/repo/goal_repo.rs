//! Goal/habit repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the transactional CRUD operations behind the controller.
//! - Translate SQLite constraint conflicts into domain failures.
//!
//! # Invariants
//! - Every mutating operation runs in exactly one `IMMEDIATE` transaction.
//! - A domain failure rolls the transaction back before it is returned.
//! - Deleting a goal removes its habits explicitly; the schema has no cascade.
//! - Habits are matched by `(goal, name)`, never by counter value.
//! - Goal and habit names are normalized before every lookup, so a name
//!   matches the same row however its whitespace was entered.
//! - Reads spanning several statements run inside one read transaction.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::goal::Goal;
use crate::model::habit::{Habit, HabitKey};
use crate::model::name::{normalize_name, ModelValidationError};
use log::{debug, info, log, Level};
use rusqlite::{
    ffi, params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

const GOAL_SELECT_SQL: &str = "SELECT name FROM goals";
const HABIT_SELECT_SQL: &str = "SELECT goal_name, name, counter FROM habits";

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from goal/habit store operations.
#[derive(Debug)]
pub enum StoreError {
    /// A goal with this name already exists.
    DuplicateGoal(String),
    /// No goal with this name exists.
    GoalNotFound(String),
    /// The goal already owns a habit with this name.
    DuplicateHabit(HabitKey),
    /// No habit with this identity exists.
    HabitNotFound { goal: Option<String>, name: String },
    /// Decrement would take the counter below zero.
    CounterUnderflow(HabitKey),
    /// User-entered name failed validation.
    InvalidName(ModelValidationError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to the domain model.
    InvalidData(String),
    /// A previous operation panicked while holding the connection.
    ConnectionPoisoned,
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
}

impl StoreError {
    /// Returns whether this is an expected, user-facing failure.
    ///
    /// Everything else is an infrastructure error that callers log and
    /// propagate.
    pub fn is_domain_failure(&self) -> bool {
        matches!(
            self,
            Self::DuplicateGoal(_)
                | Self::GoalNotFound(_)
                | Self::DuplicateHabit(_)
                | Self::HabitNotFound { .. }
                | Self::CounterUnderflow(_)
                | Self::InvalidName(_)
        )
    }

    /// Level at which the store logs this failure.
    ///
    /// Domain failures are routine user feedback and stay below `Warn`, so
    /// they never reach the stderr duplicate of the log file.
    pub fn log_level(&self) -> Level {
        if self.is_domain_failure() {
            Level::Info
        } else {
            Level::Warn
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateGoal(name) => write!(f, "The goal {name} already exists"),
            Self::GoalNotFound(name) => write!(f, "The goal {name} does not exist"),
            Self::DuplicateHabit(key) => write!(
                f,
                "The habit {} already exists for the current goal",
                key.name
            ),
            Self::HabitNotFound { name, .. } => write!(f, "The habit {name} does not exist"),
            Self::CounterUnderflow(_) => {
                write!(f, "You can't decrement a counter equal to zero!")
            }
            Self::InvalidName(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "goal store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "goal store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "goal store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted goal data: {message}"),
            Self::ConnectionPoisoned => write!(f, "goal store connection is poisoned"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidName(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ModelValidationError> for StoreError {
    fn from(value: ModelValidationError) -> Self {
        Self::InvalidName(value)
    }
}

/// Repository interface for goal and habit persistence.
///
/// Implementations are shared between dispatcher workers, so every method
/// takes `&self` and must be safe to call concurrently.
pub trait GoalRepository: Send + Sync {
    /// Lists all goals in insertion order with their habits populated.
    fn find_all_goals(&self) -> StoreResult<Vec<Goal>>;
    /// Loads one goal by name.
    fn find_goal_by_name(&self, name: &str) -> StoreResult<Option<Goal>>;
    /// Persists a new goal and returns the stored shape.
    fn add_goal(&self, goal: &Goal) -> StoreResult<Goal>;
    /// Deletes a goal and all of its habits.
    fn delete_goal(&self, goal: &Goal) -> StoreResult<()>;
    /// Links `habit` to `goal`, persists it and returns the linked habit.
    fn add_habit_to_goal(&self, goal: &Goal, habit: &Habit) -> StoreResult<Habit>;
    /// Unlinks and deletes the habit matching `(goal.name, habit.name)`.
    fn remove_habit_from_goal(&self, goal: &Goal, habit: &Habit) -> StoreResult<()>;
    /// Persists `counter + 1` and returns the updated habit.
    fn increment_counter(&self, habit: &Habit) -> StoreResult<Habit>;
    /// Persists `counter - 1` and returns the updated habit.
    ///
    /// Callers check for zero first; the schema only rejects underflow.
    fn decrement_counter(&self, habit: &Habit) -> StoreResult<Habit>;
}

/// SQLite-backed goal repository owning its connection.
pub struct SqliteGoalRepository {
    conn: Mutex<Connection>,
}

impl SqliteGoalRepository {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_goal_connection_ready(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Gives the connection back, e.g. for inspection in tests.
    pub fn into_inner(self) -> StoreResult<Connection> {
        self.conn
            .into_inner()
            .map_err(|_| StoreError::ConnectionPoisoned)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::ConnectionPoisoned)
    }
}

impl GoalRepository for SqliteGoalRepository {
    fn find_all_goals(&self) -> StoreResult<Vec<Goal>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut goals = Vec::new();
        let mut index_by_name = HashMap::new();
        {
            let mut stmt = tx.prepare(&format!("{GOAL_SELECT_SQL} ORDER BY rowid ASC;"))?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let goal = Goal::new(row.get::<_, String>("name")?);
                index_by_name.insert(goal.name.clone(), goals.len());
                goals.push(goal);
            }
        }

        {
            let mut stmt = tx.prepare(&format!("{HABIT_SELECT_SQL} ORDER BY rowid ASC;"))?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let habit = parse_habit_row(row)?;
                let owner = habit.goal.as_deref().unwrap_or_default();
                let index = *index_by_name.get(owner).ok_or_else(|| {
                    StoreError::InvalidData(format!(
                        "habit `{}` references unknown goal `{owner}`",
                        habit.name
                    ))
                })?;
                goals[index].habits.push(habit);
            }
        }
        tx.commit()?;

        debug!(
            "event=goals_list module=repo status=ok count={}",
            goals.len()
        );
        Ok(goals)
    }

    fn find_goal_by_name(&self, name: &str) -> StoreResult<Option<Goal>> {
        let Ok(name) = normalize_name(name, "goal") else {
            return Ok(None);
        };
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let goal = load_goal(&tx, &name)?;
        tx.commit()?;
        Ok(goal)
    }

    fn add_goal(&self, goal: &Goal) -> StoreResult<Goal> {
        let name = goal_key(goal)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Err(err) = tx.execute("INSERT INTO goals (name) VALUES (?1);", [name.as_str()]) {
            return match conflict_kind(&err) {
                Some(Conflict::Duplicate) => {
                    tx.rollback()?;
                    Err(log_failure("goal_add", StoreError::DuplicateGoal(name)))
                }
                _ => Err(err.into()),
            };
        }
        tx.commit()?;

        info!("event=goal_add module=repo status=ok");
        Ok(Goal::new(name))
    }

    fn delete_goal(&self, goal: &Goal) -> StoreResult<()> {
        let name = goal_key(goal)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed_habits =
            tx.execute("DELETE FROM habits WHERE goal_name = ?1;", [name.as_str()])?;
        let removed_goals = tx.execute("DELETE FROM goals WHERE name = ?1;", [name.as_str()])?;
        if removed_goals == 0 {
            tx.rollback()?;
            return Err(log_failure("goal_delete", StoreError::GoalNotFound(name)));
        }
        tx.commit()?;

        info!("event=goal_delete module=repo status=ok removed_habits={removed_habits}");
        Ok(())
    }

    fn add_habit_to_goal(&self, goal: &Goal, habit: &Habit) -> StoreResult<Habit> {
        let goal_name = goal_key(goal)?;
        let name = normalize_name(&habit.name, "habit")?;
        let mut linked = Habit::linked(goal_name.clone(), name, habit.counter);
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let inserted = tx.execute(
            "INSERT INTO habits (goal_name, name, counter) VALUES (?1, ?2, ?3);",
            params![goal_name, linked.name, linked.counter],
        );
        if let Err(err) = inserted {
            let failure = match conflict_kind(&err) {
                Some(Conflict::Duplicate) => {
                    StoreError::DuplicateHabit(HabitKey::new(goal_name, linked.name))
                }
                Some(Conflict::MissingParent) => StoreError::GoalNotFound(goal_name),
                _ => return Err(err.into()),
            };
            tx.rollback()?;
            return Err(log_failure("habit_add", failure));
        }
        linked.counter = read_counter(&tx, &goal_name, &linked.name)?.unwrap_or(linked.counter);
        tx.commit()?;

        info!("event=habit_add module=repo status=ok");
        Ok(linked)
    }

    fn remove_habit_from_goal(&self, goal: &Goal, habit: &Habit) -> StoreResult<()> {
        let goal_name = goal_key(goal)?;
        let name = normalize_name(&habit.name, "habit")?;
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx.execute(
            "DELETE FROM habits WHERE goal_name = ?1 AND name = ?2;",
            params![goal_name, name],
        )?;
        if removed == 0 {
            tx.rollback()?;
            return Err(log_failure(
                "habit_remove",
                StoreError::HabitNotFound {
                    goal: Some(goal_name),
                    name,
                },
            ));
        }
        tx.commit()?;

        info!("event=habit_remove module=repo status=ok");
        Ok(())
    }

    fn increment_counter(&self, habit: &Habit) -> StoreResult<Habit> {
        self.apply_counter_delta(habit, 1)
    }

    fn decrement_counter(&self, habit: &Habit) -> StoreResult<Habit> {
        self.apply_counter_delta(habit, -1)
    }
}

impl SqliteGoalRepository {
    fn apply_counter_delta(&self, habit: &Habit, delta: i64) -> StoreResult<Habit> {
        let key = habit.key().ok_or_else(|| StoreError::HabitNotFound {
            goal: None,
            name: habit.name.clone(),
        })?;
        let key = HabitKey::new(
            normalize_name(&key.goal, "goal")?,
            normalize_name(&key.name, "habit")?,
        );
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let updated = tx.execute(
            "UPDATE habits SET counter = counter + ?3 WHERE goal_name = ?1 AND name = ?2;",
            params![key.goal, key.name, delta],
        );
        let failure = match updated {
            Ok(0) => StoreError::HabitNotFound {
                goal: Some(key.goal),
                name: key.name,
            },
            Ok(_) => {
                let counter = read_counter(&tx, &key.goal, &key.name)?.ok_or_else(|| {
                    StoreError::InvalidData(format!("habit `{}` vanished mid-update", key.name))
                })?;
                tx.commit()?;
                debug!("event=counter_update module=repo status=ok delta={delta}");
                return Ok(Habit::linked(key.goal, key.name, counter));
            }
            Err(err) if conflict_kind(&err) == Some(Conflict::Check) => {
                StoreError::CounterUnderflow(key)
            }
            Err(err) => return Err(err.into()),
        };

        tx.rollback()?;
        Err(log_failure("counter_update", failure))
    }
}

fn goal_key(goal: &Goal) -> StoreResult<String> {
    Ok(normalize_name(&goal.name, "goal")?)
}

fn log_failure(event: &'static str, err: StoreError) -> StoreError {
    log!(
        err.log_level(),
        "event={event} module=repo status=error error={err}"
    );
    err
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conflict {
    Duplicate,
    MissingParent,
    Check,
}

fn conflict_kind(err: &rusqlite::Error) -> Option<Conflict> {
    let rusqlite::Error::SqliteFailure(failure, _) = err else {
        return None;
    };
    if failure.code != ErrorCode::ConstraintViolation {
        return None;
    }
    match failure.extended_code {
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
            Some(Conflict::Duplicate)
        }
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Conflict::MissingParent),
        ffi::SQLITE_CONSTRAINT_CHECK => Some(Conflict::Check),
        _ => None,
    }
}

fn load_goal(tx: &Transaction<'_>, name: &str) -> StoreResult<Option<Goal>> {
    let found: Option<String> = tx
        .query_row(
            &format!("{GOAL_SELECT_SQL} WHERE name = ?1;"),
            [name],
            |row| row.get(0),
        )
        .optional()?;
    let Some(found) = found else {
        return Ok(None);
    };

    let mut goal = Goal::new(found);
    let mut stmt = tx.prepare(&format!(
        "{HABIT_SELECT_SQL} WHERE goal_name = ?1 ORDER BY rowid ASC;"
    ))?;
    let mut rows = stmt.query([goal.name.as_str()])?;
    while let Some(row) = rows.next()? {
        goal.habits.push(parse_habit_row(row)?);
    }
    Ok(Some(goal))
}

fn read_counter(tx: &Transaction<'_>, goal: &str, name: &str) -> StoreResult<Option<u32>> {
    let counter: Option<i64> = tx
        .query_row(
            "SELECT counter FROM habits WHERE goal_name = ?1 AND name = ?2;",
            params![goal, name],
            |row| row.get(0),
        )
        .optional()?;
    counter.map(|value| counter_from_db(value, name)).transpose()
}

fn parse_habit_row(row: &Row<'_>) -> StoreResult<Habit> {
    let goal: String = row.get("goal_name")?;
    let name: String = row.get("name")?;
    let counter = counter_from_db(row.get("counter")?, &name)?;
    Ok(Habit::linked(goal, name, counter))
}

fn counter_from_db(value: i64, name: &str) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid counter value `{value}` for habit `{name}` in habits.counter"
        ))
    })
}

fn ensure_goal_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let required: [(&'static str, &[&'static str]); 2] = [
        ("goals", &["name", "created_at"]),
        ("habits", &["goal_name", "name", "counter", "created_at"]),
    ];
    for (table, columns) in required {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(StoreError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
