//! Time window and current value of a single interpolation

use crate::value::Tweenable;
use crate::Seconds;

/// Start/end values, timing window, and live progress of one tween
///
/// The start timestamp is not known at construction: it is stamped by the
/// engine on the first tick that observes the operation, so the delay window
/// is measured from when the engine first saw it rather than from creation.
#[derive(Clone, Debug)]
pub struct Period<T> {
    start: T,
    end: T,
    duration: Seconds,
    delay: Seconds,
    start_timestamp: Option<Seconds>,
    updated_timestamp: Option<Seconds>,
    progress: T,
}

impl<T: Tweenable> Period<T> {
    /// Create a period with no delay
    pub fn new(start: T, end: T, duration: Seconds) -> Self {
        Self {
            progress: start.clone(),
            start,
            end,
            duration,
            delay: 0.0,
            start_timestamp: None,
            updated_timestamp: None,
        }
    }

    /// Builder: wait `delay` seconds after the first tick before advancing
    ///
    /// Negative delays are treated as zero.
    pub fn with_delay(mut self, delay: Seconds) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    pub fn start(&self) -> &T {
        &self.start
    }

    pub fn end(&self) -> &T {
        &self.end
    }

    /// Current interpolated value
    pub fn progress(&self) -> &T {
        &self.progress
    }

    pub fn duration(&self) -> Seconds {
        self.duration
    }

    pub fn delay(&self) -> Seconds {
        self.delay
    }

    pub fn start_timestamp(&self) -> Option<Seconds> {
        self.start_timestamp
    }

    pub fn updated_timestamp(&self) -> Option<Seconds> {
        self.updated_timestamp
    }

    /// Stamp the start time; a no-op once a start time exists
    pub fn set_start_timestamp(&mut self, timestamp: Seconds) {
        if self.start_timestamp.is_none() {
            self.start_timestamp = Some(timestamp);
        }
    }

    /// True once the delay window has closed
    pub fn has_started(&self, now: Seconds) -> bool {
        match self.start_timestamp {
            Some(start) => now >= start + self.delay,
            None => false,
        }
    }

    /// True once the full delay + duration window has elapsed
    pub fn has_ended(&self, now: Seconds) -> bool {
        match self.start_timestamp {
            Some(start) => now >= start + self.delay + self.duration,
            None => false,
        }
    }

    /// Seconds since the delay window closed (negative while still delayed)
    pub fn elapsed(&self, now: Seconds) -> Seconds {
        match self.start_timestamp {
            Some(start) => now - start - self.delay,
            None => 0.0,
        }
    }

    pub(crate) fn set_progress(&mut self, value: T, now: Seconds) {
        self.progress = value;
        self.updated_timestamp = Some(now);
    }

    /// Move the start time forward so paused time does not count as elapsed
    pub(crate) fn shift_start(&mut self, by: Seconds) {
        if let Some(start) = self.start_timestamp.as_mut() {
            *start += by;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_period_is_unstarted() {
        let period = Period::new(0.0f64, 100.0, 1.0);
        assert_eq!(*period.progress(), 0.0);
        assert_eq!(period.start_timestamp(), None);
        assert!(!period.has_started(10.0));
        assert!(!period.has_ended(10.0));
    }

    #[test]
    fn test_start_timestamp_set_once() {
        let mut period = Period::new(0.0f64, 1.0, 1.0);
        period.set_start_timestamp(2.0);
        period.set_start_timestamp(5.0);
        assert_eq!(period.start_timestamp(), Some(2.0));
    }

    #[test]
    fn test_started_and_ended_with_delay() {
        let mut period = Period::new(0.0f64, 1.0, 2.0).with_delay(1.0);
        period.set_start_timestamp(10.0);

        assert!(!period.has_started(10.5));
        assert!(period.has_started(11.0));
        assert!(!period.has_ended(12.5));
        // Ties count as ended
        assert!(period.has_ended(13.0));
        assert_eq!(period.elapsed(12.0), 1.0);
        assert_eq!(period.elapsed(10.5), -0.5);
    }

    #[test]
    fn test_negative_delay_clamped() {
        let period = Period::new(0.0f64, 1.0, 1.0).with_delay(-3.0);
        assert_eq!(period.delay(), 0.0);
    }

    #[test]
    fn test_shift_start_only_when_stamped() {
        let mut period = Period::new(0.0f64, 1.0, 1.0);
        period.shift_start(4.0);
        assert_eq!(period.start_timestamp(), None);

        period.set_start_timestamp(1.0);
        period.shift_start(4.0);
        assert_eq!(period.start_timestamp(), Some(5.0));
    }
}
