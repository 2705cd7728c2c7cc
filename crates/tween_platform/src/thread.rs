//! Dedicated-thread clock driver

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tween_core::{Cadence, ClockDriver, ClockKind, EngineHandle};

/// Default emulated display refresh rate for frame-synchronized cadence
pub const DEFAULT_REFRESH_RATE: f64 = 60.0;

struct Worker {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Ticks the engine from a background OS thread
///
/// Frame-synchronized cadence emulates a display refreshing at
/// `refresh_rate` Hz and ticks on every `frame_skip`-th frame. Fixed-interval
/// cadence ticks every `interval` seconds and skips deadlines it has already
/// missed instead of bursting to catch up.
///
/// `stop` only signals the thread; it never joins, so it is safe to call from
/// inside a tick. The thread exits at its next wake-up.
pub struct ThreadClockDriver {
    refresh_rate: f64,
    worker: Option<Worker>,
}

impl ThreadClockDriver {
    pub fn new() -> Self {
        Self {
            refresh_rate: DEFAULT_REFRESH_RATE,
            worker: None,
        }
    }

    /// Builder: emulated display refresh rate in Hz
    ///
    /// Non-positive or non-finite rates fall back to the default.
    pub fn with_refresh_rate(mut self, refresh_rate: f64) -> Self {
        self.refresh_rate = sanitize_refresh_rate(refresh_rate);
        self
    }

    pub fn refresh_rate(&self) -> f64 {
        self.refresh_rate
    }
}

impl Default for ThreadClockDriver {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn sanitize_refresh_rate(refresh_rate: f64) -> f64 {
    if refresh_rate.is_finite() && refresh_rate > 0.0 {
        refresh_rate
    } else {
        tracing::warn!(refresh_rate, "invalid refresh rate, using default");
        DEFAULT_REFRESH_RATE
    }
}

impl ClockDriver for ThreadClockDriver {
    fn start(&mut self, cadence: &Cadence, target: EngineHandle) {
        if self.is_running() {
            return;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let cadence = *cadence;
        let (Some(frame), Some(interval)) = (
            tick_duration(1.0 / self.refresh_rate),
            tick_duration(cadence.interval),
        ) else {
            tracing::error!(?cadence, "tick period out of range, clock thread not started");
            return;
        };

        let spawned = thread::Builder::new()
            .name("tween-clock".to_string())
            .spawn(move || match cadence.kind {
                ClockKind::FrameSynchronized => {
                    run_frames(frame, cadence.frame_skip.max(1), &stop_flag, &target)
                }
                ClockKind::FixedInterval | ClockKind::None => {
                    run_interval(interval, &stop_flag, &target)
                }
            });

        match spawned {
            Ok(thread) => {
                tracing::debug!(?cadence, "tween clock thread started");
                self.worker = Some(Worker { stop, thread });
            }
            Err(err) => {
                tracing::error!(%err, "failed to spawn tween clock thread");
            }
        }
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Release);
            tracing::debug!("tween clock thread signalled to stop");
        }
    }

    fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.thread.is_finished())
    }
}

impl Drop for ThreadClockDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_frames(frame: Duration, frame_skip: u32, stop: &AtomicBool, target: &EngineHandle) {
    let mut next_frame = Instant::now() + frame;
    let mut frame_index: u64 = 0;

    loop {
        sleep_until(next_frame);
        if stop.load(Ordering::Acquire) {
            return;
        }

        frame_index += 1;
        next_frame = next_deadline(next_frame, frame);
        if frame_index % frame_skip as u64 != 0 {
            continue;
        }
        if target.tick_now().is_none() {
            // Engine dropped
            return;
        }
    }
}

fn run_interval(interval: Duration, stop: &AtomicBool, target: &EngineHandle) {
    let mut next_tick = Instant::now() + interval;

    loop {
        sleep_until(next_tick);
        if stop.load(Ordering::Acquire) {
            return;
        }
        if target.tick_now().is_none() {
            return;
        }
        next_tick = next_deadline(next_tick, interval);
    }
}

fn tick_duration(seconds: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(seconds)
        .ok()
        .filter(|period| !period.is_zero())
}

/// Advance a deadline by one period, skipping any periods already missed
fn next_deadline(previous: Instant, period: Duration) -> Instant {
    let next = previous + period;
    let now = Instant::now();
    if next < now {
        now + period
    } else {
        next
    }
}

fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if deadline > now {
        thread::sleep(deadline - now);
    }
}
