//! Tween engine
//!
//! Advances every registered operation once per delivered tick, keeps the
//! clock driver running exactly while there is unpaused work, and shifts
//! operation start times across pauses so a pause is invisible to each
//! operation's elapsed-time accounting.
//!
//! # Locking
//!
//! Engine state (pause, cadence, driver) and the registry each sit behind
//! their own mutex; when both are needed the state lock is taken first. No
//! lock is held while a notification runs, so notifications may call back into
//! the engine freely. A tick that arrives while another tick is still being
//! processed is dropped, not queued.

use crate::clock::{Cadence, ClockDriver, ClockKind, ManualDriver, MonotonicClock, TimeSource};
use crate::config::EngineConfig;
use crate::error::{Result, TweenError};
use crate::operation::{Advance, Operation, Phase, Scheduled};
use crate::registry::{OperationId, Registry, SharedOperation};
use crate::value::Tweenable;
use crate::Seconds;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Outcome of a call to [`TweenEngine::tick`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickStatus {
    /// Every operation in the snapshot was visited
    Processed,
    /// Another tick was in progress; this one was dropped
    Busy,
    /// Engine is paused; nothing was advanced
    Paused,
}

/// Counters for diagnostics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub ticks_processed: u64,
    pub ticks_dropped: u64,
    pub operations_completed: u64,
}

struct EngineState {
    paused: bool,
    paused_at: Option<Seconds>,
    /// Bumped on every pause or resume transition
    pause_epoch: u64,
    cadence: Cadence,
    driver: Box<dyn ClockDriver>,
}

struct Shared {
    registry: Mutex<Registry>,
    state: Mutex<EngineState>,
    busy: AtomicBool,
    clock: Arc<dyn TimeSource>,
    ticks_processed: AtomicU64,
    ticks_dropped: AtomicU64,
    operations_completed: AtomicU64,
}

/// Clears the busy flag when a tick finishes, including by unwinding
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The tween scheduler
///
/// Cloning is cheap and yields another handle to the same engine.
#[derive(Clone)]
pub struct TweenEngine {
    shared: Arc<Shared>,
}

impl TweenEngine {
    /// Engine with a [`ManualDriver`], a monotonic clock, and default cadence
    pub fn new() -> Self {
        Self::from_parts(
            Box::new(ManualDriver::new()),
            Arc::new(MonotonicClock::new()),
            Cadence::default(),
            false,
        )
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    fn from_parts(
        driver: Box<dyn ClockDriver>,
        clock: Arc<dyn TimeSource>,
        cadence: Cadence,
        paused: bool,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(Registry::new()),
                state: Mutex::new(EngineState {
                    paused,
                    paused_at: None,
                    pause_epoch: 0,
                    cadence,
                    driver,
                }),
                busy: AtomicBool::new(false),
                clock,
                ticks_processed: AtomicU64::new(0),
                ticks_dropped: AtomicU64::new(0),
                operations_completed: AtomicU64::new(0),
            }),
        }
    }

    /// A weak handle for drivers and notification closures
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Current time on the engine's time base
    pub fn now(&self) -> Seconds {
        self.shared.clock.now()
    }

    // =========================================================================
    // Operation Management
    // =========================================================================

    /// Schedule an operation
    ///
    /// Operations with a non-positive duration are rejected and never ticked.
    /// Accepted operations start the clock driver if it was idle.
    pub fn register<T: Tweenable>(&self, operation: Operation<T>) -> Result<OperationId> {
        let name = operation.name().map(str::to_owned);
        let id = self
            .shared
            .registry
            .lock()
            .add(name.clone(), Box::new(operation))?;

        tracing::debug!(
            ?id,
            name = name.as_deref().unwrap_or("<unnamed>"),
            "registered tween operation"
        );
        self.sync_driver();
        Ok(id)
    }

    /// Build and schedule a linear tween in one call
    pub fn tween<T: Tweenable>(
        &self,
        start: T,
        end: T,
        duration: Seconds,
        delay: Seconds,
    ) -> Result<OperationId> {
        self.register(Operation::tween(start, end, duration).with_delay(delay))
    }

    /// Remove an operation without completing it
    ///
    /// Its completion notification never fires. Returns false if it was not
    /// registered (already expired or removed).
    pub fn unregister(&self, id: OperationId) -> bool {
        let removed = self.shared.registry.lock().remove(id);
        if removed {
            tracing::debug!(?id, "unregistered tween operation");
            self.sync_driver();
        }
        removed
    }

    /// Remove the first operation registered under `name`
    pub fn unregister_by_name(&self, name: &str) -> bool {
        let removed = self.shared.registry.lock().remove_by_name(name);
        match removed {
            Some(id) => {
                tracing::debug!(?id, name, "unregistered tween operation by name");
                self.sync_driver();
                true
            }
            None => {
                tracing::trace!(name, "no tween operation to unregister");
                false
            }
        }
    }

    /// Remove every operation; none of them complete
    pub fn remove_all(&self) -> usize {
        let removed = self.shared.registry.lock().remove_all();
        if removed > 0 {
            tracing::debug!(removed, "removed all tween operations");
        }
        self.sync_driver();
        removed
    }

    pub fn has_operations(&self) -> bool {
        !self.shared.registry.lock().is_empty()
    }

    pub fn has_operation(&self, name: &str) -> bool {
        self.shared.registry.lock().contains_name(name)
    }

    pub fn contains(&self, id: OperationId) -> bool {
        self.shared.registry.lock().contains(id)
    }

    /// Identity of the first operation registered under `name`
    pub fn find(&self, name: &str) -> Option<OperationId> {
        self.shared.registry.lock().find_by_name(name)
    }

    pub fn operation_count(&self) -> usize {
        self.shared.registry.lock().len()
    }

    /// Lifecycle phase of the first operation named `name`, as of now
    pub fn phase(&self, name: &str) -> Result<Phase> {
        let now = self.now();
        let registry = self.shared.registry.lock();
        let operation = registry
            .find_by_name(name)
            .and_then(|id| registry.get(id))
            .ok_or_else(|| TweenError::NotFound(name.to_string()))?;
        let phase = operation.lock().phase_at(now);
        Ok(phase)
    }

    // =========================================================================
    // Tick Processing
    // =========================================================================

    /// Advance every registered operation to timestamp `now`
    ///
    /// Visits a snapshot of the registry taken at entry: operations added
    /// during the tick wait for the next one, and operations removed during
    /// the tick are skipped. Expired operations are removed before their
    /// completion notification is delivered.
    ///
    /// A pause or resume that lands while the tick is running (from a
    /// notification or another thread) ends the tick: the rest of the snapshot
    /// is left untouched and `Paused` is returned. `set_paused` does not wait
    /// for the tick, since an inline notification calling it would deadlock.
    pub fn tick(&self, now: Seconds) -> TickStatus {
        let Some(_busy) = BusyGuard::acquire(&self.shared.busy) else {
            self.shared.ticks_dropped.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(now, "dropping re-entrant tick");
            return TickStatus::Busy;
        };

        let epoch = {
            let state = self.shared.state.lock();
            if state.paused {
                tracing::trace!(now, "ignoring tick while paused");
                return TickStatus::Paused;
            }
            state.pause_epoch
        };

        let snapshot = self.shared.registry.lock().snapshot();
        for (id, operation) in snapshot {
            if self.pause_changed_since(epoch) {
                tracing::trace!(now, "pause state changed mid-tick, ending tick");
                return TickStatus::Paused;
            }
            if !self.shared.registry.lock().contains(id) {
                continue;
            }

            let advance = operation.lock().advance(now);
            match advance {
                Advance::Stamped | Advance::Idle => {}
                Advance::Updated(update) => {
                    if let Some(update) = update {
                        update.deliver();
                    }
                }
                Advance::Expired(update) => {
                    if let Some(update) = update {
                        update.deliver();
                    }
                    self.complete(id, &operation);
                }
            }
        }

        self.shared.ticks_processed.fetch_add(1, Ordering::Relaxed);
        self.sync_driver();
        TickStatus::Processed
    }

    fn pause_changed_since(&self, epoch: u64) -> bool {
        let state = self.shared.state.lock();
        state.paused || state.pause_epoch != epoch
    }

    /// Tick with the engine's own clock reading
    pub fn tick_now(&self) -> TickStatus {
        self.tick(self.now())
    }

    fn complete(&self, id: OperationId, operation: &SharedOperation) {
        // Removed concurrently by someone else: that counts as a manual removal
        if !self.shared.registry.lock().remove(id) {
            return;
        }
        self.shared
            .operations_completed
            .fetch_add(1, Ordering::Relaxed);
        tracing::trace!(?id, "tween operation expired");

        let completion = operation.lock().take_completion();
        if let Some(completion) = completion {
            completion.deliver();
        }
    }

    // =========================================================================
    // Pause / Resume
    // =========================================================================

    pub fn pause(&self) {
        self.set_paused(true);
    }

    pub fn resume(&self) {
        self.set_paused(false);
    }

    pub fn is_paused(&self) -> bool {
        self.shared.state.lock().paused
    }

    /// Pause or resume
    ///
    /// Pausing records the current time and stops the driver. Resuming pushes
    /// every stamped start timestamp forward by the paused interval, then
    /// restarts the driver if there is work.
    pub fn set_paused(&self, paused: bool) {
        let mut state = self.shared.state.lock();
        if state.paused == paused {
            return;
        }
        state.paused = paused;
        state.pause_epoch = state.pause_epoch.wrapping_add(1);
        let now = self.shared.clock.now();

        if paused {
            state.paused_at = Some(now);
            tracing::debug!(now, "tween engine paused");
        } else if let Some(paused_at) = state.paused_at.take() {
            let shift = now - paused_at;
            let registry = self.shared.registry.lock();
            for (_, operation) in registry.snapshot() {
                operation.lock().shift_start(shift);
            }
            tracing::debug!(now, shift, "tween engine resumed");
        }

        self.sync_driver_locked(&mut state);
    }

    // =========================================================================
    // Cadence / Driver
    // =========================================================================

    pub fn cadence(&self) -> Cadence {
        self.shared.state.lock().cadence
    }

    /// Replace the cadence, restarting the driver
    ///
    /// The driver is always stopped and, if there is unpaused work, started
    /// again with the new cadence. Operation state is untouched.
    pub fn set_cadence(&self, cadence: Cadence) -> Result<()> {
        if let Err(err) = cadence.validate() {
            tracing::warn!(%err, "rejecting cadence change");
            return Err(err);
        }

        let mut state = self.shared.state.lock();
        state.driver.stop();
        state.cadence = cadence;
        tracing::debug!(?cadence, "tween cadence changed");
        self.sync_driver_locked(&mut state);
        Ok(())
    }

    pub fn set_clock_kind(&self, kind: ClockKind) -> Result<()> {
        self.set_cadence(Cadence {
            kind,
            ..self.cadence()
        })
    }

    pub fn set_frame_skip(&self, frame_skip: u32) -> Result<()> {
        self.set_cadence(Cadence {
            frame_skip,
            ..self.cadence()
        })
    }

    pub fn set_interval(&self, interval: Seconds) -> Result<()> {
        self.set_cadence(Cadence {
            interval,
            ..self.cadence()
        })
    }

    /// Swap the clock driver, stopping the old one
    pub fn set_driver(&self, driver: Box<dyn ClockDriver>) {
        let mut state = self.shared.state.lock();
        state.driver.stop();
        state.driver = driver;
        self.sync_driver_locked(&mut state);
    }

    pub fn is_driver_running(&self) -> bool {
        self.shared.state.lock().driver.is_running()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            ticks_processed: self.shared.ticks_processed.load(Ordering::Relaxed),
            ticks_dropped: self.shared.ticks_dropped.load(Ordering::Relaxed),
            operations_completed: self.shared.operations_completed.load(Ordering::Relaxed),
        }
    }

    fn sync_driver(&self) {
        let mut state = self.shared.state.lock();
        self.sync_driver_locked(&mut state);
    }

    /// Run the driver iff there is work, the engine is unpaused, and a clock
    /// kind is configured
    fn sync_driver_locked(&self, state: &mut EngineState) {
        let has_work = !self.shared.registry.lock().is_empty();
        let wanted = has_work && !state.paused && state.cadence.kind != ClockKind::None;
        let running = state.driver.is_running();

        if wanted && !running {
            tracing::debug!(cadence = ?state.cadence, "starting tween clock driver");
            state.driver.start(&state.cadence, self.handle());
        } else if !wanted && running {
            tracing::debug!("stopping tween clock driver");
            state.driver.stop();
        }
    }
}

impl Default for TweenEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Weak reference to an engine
///
/// Held by clock drivers and by notification closures that need to reach
/// back into the engine without keeping it alive.
#[derive(Clone, Default)]
pub struct EngineHandle {
    shared: Weak<Shared>,
}

impl EngineHandle {
    /// A handle that never resolves
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn upgrade(&self) -> Option<TweenEngine> {
        self.shared
            .upgrade()
            .map(|shared| TweenEngine { shared })
    }

    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }

    /// Deliver a tick; `None` if the engine is gone
    pub fn tick(&self, now: Seconds) -> Option<TickStatus> {
        self.upgrade().map(|engine| engine.tick(now))
    }

    /// Deliver a tick stamped with the engine's clock; `None` if the engine is gone
    pub fn tick_now(&self) -> Option<TickStatus> {
        self.upgrade().map(|engine| engine.tick_now())
    }

    /// The engine's current time; `None` if the engine is gone
    pub fn now(&self) -> Option<Seconds> {
        self.shared.upgrade().map(|shared| shared.clock.now())
    }
}

/// Configures a [`TweenEngine`] before it starts
#[derive(Default)]
pub struct EngineBuilder {
    driver: Option<Box<dyn ClockDriver>>,
    clock: Option<Arc<dyn TimeSource>>,
    cadence: Cadence,
    paused: bool,
}

impl EngineBuilder {
    pub fn driver(mut self, driver: impl ClockDriver + 'static) -> Self {
        self.driver = Some(Box::new(driver));
        self
    }

    pub fn time_source(mut self, clock: impl TimeSource + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    /// Apply clock and pause settings from a loaded config
    pub fn config(mut self, config: &EngineConfig) -> Self {
        self.cadence = config.clock;
        self.paused = config.paused;
        self
    }

    pub fn build(self) -> Result<TweenEngine> {
        self.cadence.validate()?;
        Ok(TweenEngine::from_parts(
            self.driver
                .unwrap_or_else(|| Box::new(ManualDriver::new())),
            self.clock
                .unwrap_or_else(|| Arc::new(MonotonicClock::new())),
            self.cadence,
            self.paused,
        ))
    }
}
