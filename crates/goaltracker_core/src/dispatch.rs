//! Bounded action queue executed by a fixed set of worker threads.
//!
//! # Responsibility
//! - Accept user intents from the presentation thread without blocking it.
//! - Run each intent to completion against the shared controller.
//!
//! # Invariants
//! - The queue never grows past its configured capacity.
//! - Workers never touch display state; outcomes reach the presentation
//!   thread only through the controller's view.
//! - No cancellation, retries or timeouts: an accepted action runs once.
//! - `shutdown` lets queued actions finish before joining workers.

use crate::config::DispatchSettings;
use crate::repo::goal_repo::GoalRepository;
use crate::service::goal_controller::{Action, GoalController};
use crate::view::GoalView;
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

/// Errors from starting the dispatcher or submitting actions.
#[derive(Debug)]
pub enum DispatchError {
    /// The queue is at capacity; the action was not accepted.
    QueueFull(Action),
    /// The dispatcher was shut down.
    Closed(Action),
    /// Worker count or queue capacity is zero.
    InvalidSettings(&'static str),
    /// A worker thread could not be spawned.
    Spawn(std::io::Error),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QueueFull(action) => {
                write!(f, "action queue is full; dropped `{}`", action.label())
            }
            Self::Closed(action) => {
                write!(f, "dispatcher is shut down; dropped `{}`", action.label())
            }
            Self::InvalidSettings(reason) => write!(f, "invalid dispatcher settings: {reason}"),
            Self::Spawn(err) => write!(f, "failed to spawn dispatcher worker: {err}"),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

/// Runs controller actions off the presentation thread.
pub struct ActionDispatcher {
    tx: Option<SyncSender<Action>>,
    workers: Vec<JoinHandle<()>>,
}

impl ActionDispatcher {
    /// Starts `settings.workers` threads sharing one bounded queue.
    pub fn start<R, V>(
        controller: Arc<GoalController<R, V>>,
        settings: DispatchSettings,
    ) -> Result<Self, DispatchError>
    where
        R: GoalRepository + 'static,
        V: GoalView + 'static,
    {
        if settings.workers == 0 {
            return Err(DispatchError::InvalidSettings("workers must be at least 1"));
        }
        if settings.queue_capacity == 0 {
            return Err(DispatchError::InvalidSettings(
                "queue capacity must be at least 1",
            ));
        }

        let (tx, rx) = mpsc::sync_channel::<Action>(settings.queue_capacity);
        let rx = Arc::new(Mutex::new(rx));
        let mut dispatcher = Self {
            tx: Some(tx),
            workers: Vec::with_capacity(settings.workers),
        };

        for worker_id in 0..settings.workers {
            let rx = Arc::clone(&rx);
            let controller = Arc::clone(&controller);
            let handle = std::thread::Builder::new()
                .name(format!("goaltracker-worker-{worker_id}"))
                .spawn(move || worker_loop(worker_id, &rx, &controller))
                .map_err(DispatchError::Spawn)?;
            dispatcher.workers.push(handle);
        }

        info!(
            "event=dispatcher_start module=dispatch status=ok workers={} queue_capacity={}",
            settings.workers, settings.queue_capacity
        );
        Ok(dispatcher)
    }

    /// Queues `action` without blocking.
    ///
    /// # Errors
    /// - `QueueFull` when the bounded queue is saturated.
    /// - `Closed` after `shutdown`.
    pub fn submit(&self, action: Action) -> Result<(), DispatchError> {
        let Some(tx) = &self.tx else {
            return Err(DispatchError::Closed(action));
        };
        match tx.try_send(action) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(action)) => Err(DispatchError::QueueFull(action)),
            Err(TrySendError::Disconnected(action)) => Err(DispatchError::Closed(action)),
        }
    }

    /// Closes the queue, drains it and joins every worker.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.tx.take().is_none() {
            return;
        }
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("event=dispatcher_stop module=dispatch status=error error_code=worker_panicked");
            }
        }
        info!("event=dispatcher_stop module=dispatch status=ok");
    }
}

impl Drop for ActionDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop<R, V>(
    worker_id: usize,
    rx: &Mutex<Receiver<Action>>,
    controller: &GoalController<R, V>,
) where
    R: GoalRepository,
    V: GoalView,
{
    loop {
        let next = match rx.lock() {
            Ok(guard) => guard.recv(),
            Err(_) => {
                error!("event=worker_recv module=dispatch status=error worker={worker_id} error_code=queue_poisoned");
                return;
            }
        };
        let Ok(action) = next else {
            debug!("event=worker_exit module=dispatch status=ok worker={worker_id}");
            return;
        };

        let label = action.label();
        let started_at = Instant::now();
        match controller.handle(action) {
            Ok(()) => debug!(
                "event=action_done module=dispatch status=ok worker={worker_id} action={label} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=action_done module=dispatch status=error worker={worker_id} action={label} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
    }
}
