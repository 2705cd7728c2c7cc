//! Tween operations
//!
//! An [`Operation`] is a [`Period`] plus the things the engine needs to drive
//! it: a name for best-effort lookup, a timing function, an expiry flag, and
//! optional update/completion notifications with an execution context to run
//! them on.
//!
//! # Lifecycle
//!
//! ```text
//! Pending ──first tick──▶ Delayed ──delay elapsed──▶ Active ──duration elapsed──▶ Expired
//! ```
//!
//! Expired is terminal: the engine removes the operation from its registry and
//! then delivers the completion notification.

use crate::easing::{Easing, TimingFunction};
use crate::executor::{Dispatch, ExecutionContext};
use crate::period::Period;
use crate::value::Tweenable;
use crate::Seconds;
use std::fmt;
use std::sync::Arc;

/// Called with the current period on every advancing tick
pub type UpdateCallback<T> = Arc<dyn Fn(&Period<T>) + Send + Sync>;

/// Called once with the final period after natural expiry
pub type CompletionCallback<T> = Box<dyn FnOnce(&Period<T>) + Send>;

/// Where an operation sits in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Not yet observed by a tick
    Pending,
    /// Stamped, waiting out its delay
    Delayed,
    /// Advancing toward the end value
    Active,
    /// Reached the end value
    Expired,
}

/// A single value interpolation scheduled on the engine
pub struct Operation<T: Tweenable> {
    name: Option<String>,
    period: Period<T>,
    timing: Arc<dyn TimingFunction<T>>,
    expired: bool,
    on_update: Option<UpdateCallback<T>>,
    on_complete: Option<CompletionCallback<T>>,
    context: Option<Arc<dyn ExecutionContext>>,
}

impl<T: Tweenable> Operation<T> {
    /// Wrap a period with a linear curve and no notifications
    pub fn new(period: Period<T>) -> Self {
        Self {
            name: None,
            period,
            timing: Arc::new(Easing::Linear),
            expired: false,
            on_update: None,
            on_complete: None,
            context: None,
        }
    }

    /// Shorthand for `Operation::new(Period::new(start, end, duration))`
    pub fn tween(start: T, end: T, duration: Seconds) -> Self {
        Self::new(Period::new(start, end, duration))
    }

    /// Builder: set a (non-unique) name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: set the delay before the operation starts advancing
    pub fn with_delay(mut self, delay: Seconds) -> Self {
        self.period = self.period.with_delay(delay);
        self
    }

    /// Builder: use one of the stock curves
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.timing = Arc::new(easing);
        self
    }

    /// Builder: use a custom timing function
    pub fn with_timing<F>(mut self, timing: F) -> Self
    where
        F: TimingFunction<T> + 'static,
    {
        self.timing = Arc::new(timing);
        self
    }

    /// Builder: observe every advancing tick
    pub fn on_update<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Period<T>) + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(callback));
        self
    }

    /// Builder: observe natural completion
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&Period<T>) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Builder: run notifications on `context` instead of the ticking thread
    pub fn with_context(mut self, context: Arc<dyn ExecutionContext>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn period(&self) -> &Period<T> {
        &self.period
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Lifecycle phase as of timestamp `now`
    pub fn phase(&self, now: Seconds) -> Phase {
        if self.expired {
            Phase::Expired
        } else if self.period.start_timestamp().is_none() {
            Phase::Pending
        } else if !self.period.has_started(now) {
            Phase::Delayed
        } else {
            Phase::Active
        }
    }

    fn update_dispatch(&self) -> Option<Dispatch> {
        let callback = Arc::clone(self.on_update.as_ref()?);
        let period = self.period.clone();
        Some(Dispatch::new(
            Box::new(move || callback(&period)),
            self.context.clone(),
        ))
    }
}

impl<T: Tweenable> fmt::Debug for Operation<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("period", &self.period)
            .field("expired", &self.expired)
            .field("has_update", &self.on_update.is_some())
            .field("has_completion", &self.on_complete.is_some())
            .field("has_context", &self.context.is_some())
            .finish()
    }
}

/// Result of advancing an operation by one tick
pub(crate) enum Advance {
    /// First observation: start timestamp stamped, nothing else
    Stamped,
    /// Still delayed, or already terminal
    Idle,
    /// Progress moved; carries the update notification, if any
    Updated(Option<Dispatch>),
    /// Reached the end value on this tick
    Expired(Option<Dispatch>),
}

/// Type-erased view of an operation, so one registry holds every value type
pub(crate) trait Scheduled: Send {
    fn duration(&self) -> Seconds;

    fn advance(&mut self, now: Seconds) -> Advance;

    fn phase_at(&self, now: Seconds) -> Phase;

    /// Add `by` to the start timestamp if one has been stamped
    fn shift_start(&mut self, by: Seconds);

    /// Take the completion notification; yields at most once
    fn take_completion(&mut self) -> Option<Dispatch>;
}

impl<T: Tweenable> Scheduled for Operation<T> {
    fn duration(&self) -> Seconds {
        self.period.duration()
    }

    fn advance(&mut self, now: Seconds) -> Advance {
        if self.period.start_timestamp().is_none() {
            self.period.set_start_timestamp(now);
            return Advance::Stamped;
        }
        if self.expired || !self.period.has_started(now) {
            return Advance::Idle;
        }

        if self.period.has_ended(now) {
            let end = self.period.end().clone();
            self.period.set_progress(end, now);
            self.expired = true;
            Advance::Expired(self.update_dispatch())
        } else {
            let value = self.timing.evaluate(
                self.period.elapsed(now),
                self.period.start(),
                self.period.end(),
                self.period.duration(),
            );
            self.period.set_progress(value, now);
            Advance::Updated(self.update_dispatch())
        }
    }

    fn phase_at(&self, now: Seconds) -> Phase {
        self.phase(now)
    }

    fn shift_start(&mut self, by: Seconds) {
        self.period.shift_start(by);
    }

    fn take_completion(&mut self) -> Option<Dispatch> {
        let callback = self.on_complete.take()?;
        let period = self.period.clone();
        Some(Dispatch::new(
            Box::new(move || callback(&period)),
            self.context.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn value_of(op: &Operation<f64>) -> f64 {
        *op.period().progress()
    }

    #[test]
    fn test_first_advance_only_stamps() {
        let mut op = Operation::tween(0.0f64, 100.0, 1.0);
        assert_eq!(op.phase(0.0), Phase::Pending);
        assert!(matches!(op.advance(3.0), Advance::Stamped));
        assert_eq!(op.period().start_timestamp(), Some(3.0));
        assert_eq!(value_of(&op), 0.0);
        assert_eq!(op.period().updated_timestamp(), None);
    }

    #[test]
    fn test_advance_through_lifecycle() {
        let mut op = Operation::tween(0.0f64, 100.0, 1.0).with_delay(0.5);
        op.advance(0.0);
        assert_eq!(op.phase(0.25), Phase::Delayed);
        assert!(matches!(op.advance(0.25), Advance::Idle));

        assert!(matches!(op.advance(1.0), Advance::Updated(None)));
        assert_eq!(value_of(&op), 50.0);
        assert_eq!(op.phase(1.0), Phase::Active);

        assert!(matches!(op.advance(1.5), Advance::Expired(None)));
        assert_eq!(value_of(&op), 100.0);
        assert!(op.is_expired());
        assert_eq!(op.phase(2.0), Phase::Expired);

        // Terminal: never re-advanced
        assert!(matches!(op.advance(2.0), Advance::Idle));
        assert_eq!(op.period().updated_timestamp(), Some(1.5));
    }

    #[test]
    fn test_terminal_sample_is_exact_end() {
        // A curve that never reaches its end value on its own
        let mut op =
            Operation::tween(0.0f64, 1.0, 1.0).with_timing(|_: Seconds, _: &f64, _: &f64, _: Seconds| 0.3);
        op.advance(0.0);
        op.advance(0.9);
        assert_eq!(value_of(&op), 0.3);
        op.advance(1.0);
        assert_eq!(value_of(&op), 1.0);
    }

    #[test]
    fn test_update_dispatch_carries_snapshot() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut op = Operation::tween(0.0f64, 10.0, 1.0)
            .on_update(move |period| sink.lock().push(*period.progress()));

        op.advance(0.0);
        if let Advance::Updated(Some(dispatch)) = op.advance(0.5) {
            dispatch.deliver();
        } else {
            panic!("expected an update");
        }
        assert_eq!(*seen.lock(), vec![5.0]);
    }

    #[test]
    fn test_completion_taken_once() {
        let mut op = Operation::tween(0.0f64, 1.0, 1.0).on_complete(|_| {});
        assert!(op.take_completion().is_some());
        assert!(op.take_completion().is_none());
    }

    #[test]
    fn test_easing_builder() {
        let mut op = Operation::tween(0.0f64, 100.0, 1.0)
            .named("fade")
            .with_easing(Easing::EaseInQuad);
        assert_eq!(op.name(), Some("fade"));
        op.advance(0.0);
        op.advance(0.5);
        assert_eq!(value_of(&op), 25.0);
    }
}
