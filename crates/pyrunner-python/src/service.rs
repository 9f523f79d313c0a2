//! Fixed-rate scheduler service
//!
//! One dedicated thread runs the task with zero initial delay and a fixed
//! period. Runs never overlap: an overrunning run pushes the next one to
//! start right after it. `stop()` cancels immediately: it signals the thread,
//! interrupts an in-flight run through the task's [`Interrupter`] and returns
//! without waiting. The finished thread is reaped by the next `start()`.

use crate::context::InterpreterContext;
use crate::errors::BridgeError;
use crate::task::LoaderTask;
use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};
use pyrunner_config::RunnerSettings;
use pyrunner_logger as logger;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const SCHEDULER_THREAD_NAME: &str = "pyrunner-scheduler";

/// Breaks an in-flight run from another thread
pub trait Interrupter: Send + Sync {
    /// Returns whether a run was in flight to interrupt
    fn interrupt(&self) -> bool;
}

/// A unit of work the scheduler runs on every tick.
///
/// `run` must not fail: errors are handled (logged) inside it.
pub trait ScheduledTask: Send + 'static {
    fn name(&self) -> &str {
        "task"
    }

    fn run(&mut self);

    /// Handle used by `stop()` to cut a running tick short
    fn interrupter(&self) -> Option<Arc<dyn Interrupter>> {
        None
    }
}

enum ServiceState {
    Idle(Box<dyn ScheduledTask>),
    Running {
        stop_tx: Sender<()>,
        handle: JoinHandle<Box<dyn ScheduledTask>>,
        interrupter: Option<Arc<dyn Interrupter>>,
    },
    /// Cancelled; the thread may still be unwinding an interrupted run
    Stopping(JoinHandle<Box<dyn ScheduledTask>>),
    /// The scheduler thread died and took the task with it
    Lost,
}

pub struct RunnerService {
    period: Duration,
    state: Mutex<ServiceState>,
    stopped: Condvar,
}

static SERVICE_INSTANCE: OnceCell<RunnerService> = OnceCell::new();

impl RunnerService {
    pub fn new(task: Box<dyn ScheduledTask>, period: Duration) -> Self {
        Self {
            period,
            state: Mutex::new(ServiceState::Idle(task)),
            stopped: Condvar::new(),
        }
    }

    /// Get or construct the process-wide service around a [`LoaderTask`].
    ///
    /// The context and settings are only used by the first call.
    pub fn get_instance(
        context: Arc<InterpreterContext>,
        settings: &RunnerSettings,
    ) -> &'static RunnerService {
        SERVICE_INSTANCE.get_or_init(|| {
            let task = LoaderTask::from_settings(context, settings);
            RunnerService::new(Box::new(task), settings.interval)
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), ServiceState::Running { .. })
    }

    /// Begin fixed-rate execution on the scheduler thread.
    ///
    /// After a `stop()` this first waits for the previous thread to exit, so
    /// two threads never drive the task at once.
    pub fn start(&self) -> Result<(), BridgeError> {
        let mut state = self.state.lock();
        let task = match std::mem::replace(&mut *state, ServiceState::Lost) {
            ServiceState::Idle(task) => task,
            running @ ServiceState::Running { .. } => {
                *state = running;
                logger::warn("Scheduler is already running");
                return Ok(());
            }
            ServiceState::Stopping(handle) => {
                logger::debug("Waiting for the previous scheduler thread to exit");
                reap(handle)?
            }
            ServiceState::Lost => {
                return Err(BridgeError::Scheduler(
                    "the scheduled task was lost when its thread terminated".to_string(),
                ))
            }
        };

        logger::info(&format!(
            "Starting scheduled task '{}' every {:?}",
            task.name(),
            self.period
        ));
        let interrupter = task.interrupter();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let period = self.period;
        let handle = thread::Builder::new()
            .name(SCHEDULER_THREAD_NAME.to_string())
            .spawn(move || run_fixed_rate(task, period, &stop_rx))
            .map_err(|e| BridgeError::Scheduler(format!("Failed to spawn scheduler thread: {}", e)))?;

        *state = ServiceState::Running {
            stop_tx,
            handle,
            interrupter,
        };
        Ok(())
    }

    /// Cancel the schedule and interrupt any in-flight run.
    ///
    /// Returns without waiting for the scheduler thread. No run begins after
    /// this returns.
    pub fn stop(&self) -> Result<(), BridgeError> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, ServiceState::Lost) {
            ServiceState::Running {
                stop_tx,
                handle,
                interrupter,
            } => {
                logger::info("Stopping scheduled task");
                // The thread may already be gone; reaping reports that case.
                let _ = stop_tx.send(());
                if let Some(interrupter) = interrupter {
                    if interrupter.interrupt() {
                        logger::info("Interrupted the in-flight run");
                    }
                }
                *state = ServiceState::Stopping(handle);
            }
            other => *state = other,
        }
        self.stopped.notify_all();
        Ok(())
    }

    /// Block the calling thread until the service is stopped
    pub fn wait(&self) {
        let mut state = self.state.lock();
        while matches!(*state, ServiceState::Running { .. }) {
            self.stopped.wait(&mut state);
        }
    }
}

impl Drop for RunnerService {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            logger::warn(&format!("Scheduler did not stop cleanly: {}", e));
        }
        let state = std::mem::replace(&mut *self.state.lock(), ServiceState::Lost);
        if let ServiceState::Stopping(handle) = state {
            if handle.is_finished() {
                if let Err(e) = reap(handle) {
                    logger::warn(&format!("Scheduler did not stop cleanly: {}", e));
                }
            } else {
                logger::debug("Leaving the scheduler thread to finish its current run");
            }
        }
    }
}

fn reap(handle: JoinHandle<Box<dyn ScheduledTask>>) -> Result<Box<dyn ScheduledTask>, BridgeError> {
    handle
        .join()
        .map_err(|_| BridgeError::Scheduler("scheduler thread panicked".to_string()))
}

fn run_fixed_rate(
    mut task: Box<dyn ScheduledTask>,
    period: Duration,
    stop_rx: &mpsc::Receiver<()>,
) -> Box<dyn ScheduledTask> {
    let mut next_run = Some(Instant::now());
    loop {
        let stop = match next_run {
            Some(at) => match stop_rx.recv_timeout(at.saturating_duration_since(Instant::now())) {
                Err(RecvTimeoutError::Timeout) => false,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            },
            // Next tick lies beyond the representable future
            None => {
                let _ = stop_rx.recv();
                true
            }
        };
        if stop {
            break;
        }

        if panic::catch_unwind(AssertUnwindSafe(|| task.run())).is_err() {
            logger::error(&format!("Scheduled task '{}' panicked", task.name()));
        }
        next_run = next_run.and_then(|at| at.checked_add(period));
        if next_run.is_none() {
            logger::warn(&format!(
                "Period {:?} is too long to schedule another run of '{}'",
                period,
                task.name()
            ));
        }
    }
    logger::debug(&format!("Scheduled task '{}' cancelled", task.name()));
    task
}
