//! Tokio-backed clock driver and execution context

use crate::thread::{sanitize_refresh_rate, DEFAULT_REFRESH_RATE};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tween_core::{Cadence, ClockDriver, EngineHandle, ExecutionContext, Job};

/// Ticks the engine from a task on a tokio runtime
///
/// The task runs a [`tokio::time::interval`] at the cadence's tick period.
/// Missed ticks are skipped rather than replayed. `stop` aborts the task.
pub struct TokioClockDriver {
    handle: Handle,
    refresh_rate: f64,
    task: Option<JoinHandle<()>>,
}

impl TokioClockDriver {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            refresh_rate: DEFAULT_REFRESH_RATE,
            task: None,
        }
    }

    /// Driver for the runtime the caller is running on
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Builder: emulated display refresh rate in Hz
    pub fn with_refresh_rate(mut self, refresh_rate: f64) -> Self {
        self.refresh_rate = sanitize_refresh_rate(refresh_rate);
        self
    }

    pub fn refresh_rate(&self) -> f64 {
        self.refresh_rate
    }
}

impl ClockDriver for TokioClockDriver {
    fn start(&mut self, cadence: &Cadence, target: EngineHandle) {
        if self.is_running() {
            return;
        }

        let seconds = cadence.tick_period(self.refresh_rate);
        let period = match Duration::try_from_secs_f64(seconds) {
            Ok(period) if !period.is_zero() => period,
            _ => {
                tracing::error!(seconds, "tick period out of range, clock task not started");
                return;
            }
        };
        tracing::debug!(?cadence, ?period, "tween clock task starting");

        self.task = Some(self.handle.spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if target.tick_now().is_none() {
                    tracing::debug!("engine dropped, tween clock task exiting");
                    break;
                }
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("tween clock task aborted");
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for TokioClockDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Runs notifications on tokio's blocking thread pool
#[derive(Clone, Debug)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Executor for the runtime the caller is running on
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl ExecutionContext for TokioExecutor {
    fn submit(&self, job: Job) {
        // Detached; the job's own side effects are its only result
        drop(self.handle.spawn_blocking(job));
    }
}
