//! Clock sources and drivers
//!
//! The engine does not own a timer. It asks a [`ClockDriver`] to start or stop
//! delivering ticks according to a [`Cadence`], and the driver calls back into
//! the engine through the [`EngineHandle`] it was given. Timestamps come from a
//! [`TimeSource`] shared by the engine and its driver, so pause bookkeeping and
//! tick timestamps live on the same time base.

use crate::engine::{EngineHandle, TickStatus};
use crate::error::{Result, TweenError};
use crate::Seconds;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default fixed tick interval (60 Hz)
pub const DEFAULT_INTERVAL: Seconds = 1.0 / 60.0;

/// What kind of tick source the driver should emulate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockKind {
    /// Tick on display frames, every `frame_skip`-th frame
    #[default]
    FrameSynchronized,
    /// Tick every `interval` seconds
    FixedInterval,
    /// No driver; the host calls `tick` itself
    None,
}

/// How often ticks should be delivered
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cadence {
    pub kind: ClockKind,
    /// Deliver one tick every N frames (must be >= 1)
    pub frame_skip: u32,
    /// Fixed tick period in seconds (must be > 0)
    pub interval: Seconds,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            kind: ClockKind::FrameSynchronized,
            frame_skip: 1,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl Cadence {
    pub fn frame_synchronized(frame_skip: u32) -> Self {
        Self {
            kind: ClockKind::FrameSynchronized,
            frame_skip,
            ..Default::default()
        }
    }

    pub fn fixed_interval(interval: Seconds) -> Self {
        Self {
            kind: ClockKind::FixedInterval,
            interval,
            ..Default::default()
        }
    }

    pub fn manual() -> Self {
        Self {
            kind: ClockKind::None,
            ..Default::default()
        }
    }

    /// Reject values the drivers cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.frame_skip < 1 {
            return Err(TweenError::InvalidConfig(format!(
                "frame_skip must be at least 1, got {}",
                self.frame_skip
            )));
        }
        if !self.interval.is_finite() || self.interval <= 0.0 {
            return Err(TweenError::InvalidConfig(format!(
                "interval must be a positive number of seconds, got {}",
                self.interval
            )));
        }
        if Duration::try_from_secs_f64(self.interval).is_err() {
            return Err(TweenError::InvalidConfig(format!(
                "interval of {} seconds is out of range",
                self.interval
            )));
        }
        Ok(())
    }

    /// Seconds between ticks for a display refreshing at `refresh_rate` Hz
    pub fn tick_period(&self, refresh_rate: f64) -> Seconds {
        match self.kind {
            ClockKind::FrameSynchronized => self.frame_skip.max(1) as f64 / refresh_rate,
            ClockKind::FixedInterval | ClockKind::None => self.interval,
        }
    }
}

/// Source of the current time, in seconds on a monotonic base
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Seconds;
}

/// Wall-clock time measured from when the clock was created
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> Seconds {
        self.origin.elapsed().as_secs_f64()
    }
}

/// A clock that only moves when told to
///
/// Clones share the same reading.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Seconds) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start.to_bits())),
        }
    }

    pub fn set(&self, now: Seconds) {
        self.bits.store(now.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Seconds) {
        let now = self.now() + by;
        self.set(now);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Seconds {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

/// Delivers ticks to an engine
///
/// `start` and `stop` are called with the engine's state lock held, so they
/// must return promptly and must never wait for an in-flight tick to finish.
/// Both must tolerate being called when already in the requested state.
pub trait ClockDriver: Send {
    /// Begin delivering ticks to `target` at the given cadence
    fn start(&mut self, cadence: &Cadence, target: EngineHandle);

    /// Stop delivering ticks
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

#[derive(Default)]
struct ManualDriverState {
    running: bool,
    target: Option<EngineHandle>,
    cadence: Cadence,
    starts: usize,
    stops: usize,
}

/// Driver for hosts that own their loop
///
/// The engine flips it on and off; the host checks [`wants_ticks`] once per
/// frame and calls [`fire`] when it does. Clones share state, so keep one
/// clone and hand another to the engine.
///
/// [`wants_ticks`]: ManualDriver::wants_ticks
/// [`fire`]: ManualDriver::fire
#[derive(Clone, Default)]
pub struct ManualDriver {
    state: Arc<Mutex<ManualDriverState>>,
}

impl ManualDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the engine currently has work and is not paused
    pub fn wants_ticks(&self) -> bool {
        self.state.lock().running
    }

    /// Cadence the engine last started the driver with
    pub fn cadence(&self) -> Cadence {
        self.state.lock().cadence
    }

    /// Number of stopped → running transitions
    pub fn start_count(&self) -> usize {
        self.state.lock().starts
    }

    /// Number of running → stopped transitions
    pub fn stop_count(&self) -> usize {
        self.state.lock().stops
    }

    /// Deliver a tick if the engine wants one
    ///
    /// Returns `None` when the driver is stopped or the engine is gone.
    pub fn fire(&self, now: Seconds) -> Option<TickStatus> {
        let target = {
            let state = self.state.lock();
            if !state.running {
                return None;
            }
            state.target.clone()?
        };
        // Lock released: the tick may stop this driver
        target.tick(now)
    }

    /// Deliver a tick stamped with the engine's own clock
    pub fn fire_now(&self) -> Option<TickStatus> {
        let target = {
            let state = self.state.lock();
            if !state.running {
                return None;
            }
            state.target.clone()?
        };
        target.tick_now()
    }
}

impl ClockDriver for ManualDriver {
    fn start(&mut self, cadence: &Cadence, target: EngineHandle) {
        let mut state = self.state.lock();
        state.cadence = *cadence;
        state.target = Some(target);
        if !state.running {
            state.running = true;
            state.starts += 1;
        }
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        if state.running {
            state.running = false;
            state.stops += 1;
        }
    }

    fn is_running(&self) -> bool {
        self.state.lock().running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_validation() {
        assert!(Cadence::default().validate().is_ok());
        assert!(Cadence::frame_synchronized(0).validate().is_err());
        assert!(Cadence::fixed_interval(0.0).validate().is_err());
        assert!(Cadence::fixed_interval(-1.0).validate().is_err());
        assert!(Cadence::fixed_interval(f64::NAN).validate().is_err());
        assert!(Cadence::fixed_interval(0.5).validate().is_ok());
    }

    #[test]
    fn test_cadence_rejects_unrepresentable_interval() {
        assert!(matches!(
            Cadence::fixed_interval(1e20).validate(),
            Err(TweenError::InvalidConfig(_))
        ));
        assert!(Cadence::fixed_interval(86_400.0).validate().is_ok());
    }

    #[test]
    fn test_tick_period() {
        assert_eq!(Cadence::frame_synchronized(2).tick_period(60.0), 2.0 / 60.0);
        assert_eq!(Cadence::fixed_interval(0.25).tick_period(60.0), 0.25);
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(1.0);
        let other = clock.clone();
        clock.advance(0.5);
        assert_eq!(other.now(), 1.5);
        other.set(10.0);
        assert_eq!(clock.now(), 10.0);
    }

    #[test]
    fn test_monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
        assert!(a >= 0.0);
    }

    #[test]
    fn test_manual_driver_counts_transitions_only() {
        let mut driver = ManualDriver::new();
        let observer = driver.clone();

        driver.stop();
        assert_eq!(observer.stop_count(), 0);

        driver.start(&Cadence::default(), EngineHandle::detached());
        driver.start(&Cadence::fixed_interval(0.1), EngineHandle::detached());
        assert!(observer.wants_ticks());
        assert_eq!(observer.start_count(), 1);
        assert_eq!(observer.cadence(), Cadence::fixed_interval(0.1));

        driver.stop();
        driver.stop();
        assert!(!observer.wants_ticks());
        assert_eq!(observer.stop_count(), 1);
    }

    #[test]
    fn test_manual_driver_fire_without_engine() {
        let mut driver = ManualDriver::new();
        assert_eq!(driver.fire(0.0), None);
        driver.start(&Cadence::default(), EngineHandle::detached());
        assert_eq!(driver.fire(0.0), None);
    }
}
