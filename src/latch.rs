use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Condvar, Mutex, MutexGuard, PoisonError,
    },
    time::{Duration, Instant},
};

use tracing::trace;

use crate::error::{LatchError, Result};

/// A one-shot latch that releases every waiter once a fixed amount of work
/// has been counted down.
///
/// The count is chosen at creation and only ever decreases. Producers report
/// finished work with [`count_down`](Self::count_down) or
/// [`weighted_count_down`](Self::weighted_count_down); when the remaining count
/// reaches zero all threads blocked in [`wait`](Self::wait) or
/// [`wait_timeout`](Self::wait_timeout) are woken, and every later wait returns
/// immediately. A completed latch cannot be re-armed: any further decrement
/// fails with [`LatchError::AlreadyCompleted`].
///
/// ```
/// use std::{sync::Arc, thread, time::Duration};
///
/// use count_down_latch::CountDownLatch;
///
/// let latch = Arc::new(CountDownLatch::new(3));
/// for _ in 0..3 {
///     let latch = latch.clone();
///     thread::spawn(move || {
///         // do work
///         latch.count_down().unwrap();
///     });
/// }
///
/// assert!(latch.wait_timeout(Duration::from_secs(5)));
/// assert_eq!(latch.count(), 0);
/// ```
pub struct CountDownLatch {
    remaining: Mutex<usize>,
    // Only flipped to true while `remaining` is locked, read freely by waiters.
    completed: AtomicBool,
    signal: Condvar,
}

impl CountDownLatch {
    /// Creates a latch with the given count.
    ///
    /// A count of zero yields a latch that is already complete.
    pub fn new(count: usize) -> Self {
        CountDownLatch {
            remaining: Mutex::new(count),
            completed: AtomicBool::new(count == 0),
            signal: Condvar::new(),
        }
    }

    pub fn count(&self) -> usize {
        *self.lock()
    }

    /// Never blocks.
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    pub fn count_down(&self) -> Result<()> {
        self.weighted_count_down(1)
    }

    /// Reduces the remaining count by `weight`.
    ///
    /// A weight at or above the remaining count drives it to zero and releases
    /// all waiters. A weight of zero on an incomplete latch changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`LatchError::AlreadyCompleted`] if the count down has already
    /// completed, whatever the weight (zero included).
    pub fn weighted_count_down(&self, weight: usize) -> Result<()> {
        self.decrement(|_| weight).map(drop)
    }

    /// Counts down by whatever remains, completing the latch immediately.
    ///
    /// # Errors
    ///
    /// Returns [`LatchError::AlreadyCompleted`] if the count down has already
    /// completed.
    pub fn complete(&self) -> Result<()> {
        self.decrement(|remaining| remaining).map(drop)
    }

    pub fn wait(&self) {
        if self.is_completed() {
            return;
        }

        let guard = self.lock();
        let _guard = self
            .signal
            .wait_while(guard, |_| !self.is_completed())
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Blocks until the count down completes or `timeout` elapses.
    ///
    /// Returns `true` if the latch is complete, `false` on timeout. A zero
    /// timeout only checks the current state.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_completed() {
            return true;
        }

        let guard = self.lock();
        let (_guard, result) = self
            .signal
            .wait_timeout_while(guard, timeout, |_| !self.is_completed())
            .unwrap_or_else(PoisonError::into_inner);

        !result.timed_out()
    }

    /// Like [`wait_timeout`](Self::wait_timeout), bounded by a point in time.
    /// A deadline already in the past only checks the current state.
    pub fn wait_deadline(&self, deadline: Instant) -> bool {
        self.wait_timeout(deadline.saturating_duration_since(Instant::now()))
    }

    // `weight` receives the remaining count so `complete` reads and consumes
    // it under the same guard. The returned flag is true only for the call
    // that fired the signal; tests use it to check exactly-once firing.
    fn decrement(&self, weight: impl FnOnce(usize) -> usize) -> Result<bool> {
        let mut remaining = self.lock();

        if self.completed.load(Ordering::Relaxed) {
            return Err(LatchError::AlreadyCompleted);
        }

        let weight = weight(*remaining);
        if weight < *remaining {
            *remaining -= weight;
            return Ok(false);
        }

        *remaining = 0;
        self.completed.store(true, Ordering::Release);
        self.signal.notify_all();

        trace!(weight, "latch count down complete");

        Ok(true)
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.remaining.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CountDownLatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountDownLatch")
            .field("remaining", &self.count())
            .field("completed", &self.is_completed())
            .finish()
    }
}
