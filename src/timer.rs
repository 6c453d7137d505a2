use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic time source, measured from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Virtual clock for tests; only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Jump forward to `t`. Never moves backwards.
    pub fn advance_to(&self, t: Duration) {
        if t > self.now.get() {
            self.now.set(t);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// A single cancelable "run `T` after a delay" slot.
///
/// Scheduling replaces whatever was pending, so there is never more than one
/// outstanding step.
#[derive(Debug)]
pub struct Timer<T> {
    pending: Option<(Duration, T)>,
}

impl<T> Default for Timer<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> Timer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Duration, delay: Duration, payload: T) {
        self.pending = Some((now + delay, payload));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending payload becomes due.
    pub fn deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|(at, _)| *at)
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, p)| p)
    }

    /// Remove and return the payload if its deadline has passed.
    pub fn take_due(&mut self, now: Duration) -> Option<T> {
        match self.pending {
            Some((at, _)) if at <= now => self.pending.take().map(|(_, p)| p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_after_deadline() {
        let clock = ManualClock::new();
        let mut timer = Timer::new();
        timer.schedule(clock.now(), Duration::from_millis(100), "step");

        clock.advance(Duration::from_millis(99));
        assert_eq!(timer.take_due(clock.now()), None);

        clock.advance(Duration::from_millis(1));
        assert_eq!(timer.take_due(clock.now()), Some("step"));
        assert!(!timer.is_pending());
    }

    #[test]
    fn schedule_replaces_pending() {
        let mut timer = Timer::new();
        timer.schedule(Duration::ZERO, Duration::from_millis(10), 1);
        timer.schedule(Duration::ZERO, Duration::from_millis(50), 2);
        assert_eq!(timer.deadline(), Some(Duration::from_millis(50)));
        assert_eq!(timer.take_due(Duration::from_millis(60)), Some(2));
    }

    #[test]
    fn cancel_clears_the_slot() {
        let mut timer = Timer::new();
        timer.schedule(Duration::ZERO, Duration::from_millis(10), ());
        timer.cancel();
        assert_eq!(timer.take_due(Duration::from_secs(10)), None);
        assert_eq!(timer.deadline(), None);
    }

    #[test]
    fn manual_clock_never_rewinds() {
        let clock = ManualClock::new();
        clock.advance_to(Duration::from_millis(30));
        clock.advance_to(Duration::from_millis(10));
        assert_eq!(clock.now(), Duration::from_millis(30));
    }
}
