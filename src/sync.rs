//! Auto-reset event primitive shared by the dispatcher's global signals, the
//! per-slot completion events, and the caller-owned KDF/Finalize signals.
//!
//! A condition variable guarding a boolean predicate is the idiomatic stand-in for
//! a Win32-style auto-reset event: `wait` consumes the signal it observes, and
//! `set` wakes every waiter so each can re-check the predicate for itself. This
//! mirrors `BlockingWaitStrategy`'s mutex+condvar pairing, generalized to something
//! every waiter can share without a cursor argument.

use parking_lot::{Condvar, Mutex};
use std::time::Duration;

/// A boolean signal that wakes waiters and resets itself once consumed.
pub struct AutoResetEvent {
    signaled: Mutex<bool>,
    condition: Condvar,
}

impl AutoResetEvent {
    /// Create a new event, initially unsignaled.
    pub fn new() -> Self {
        Self {
            signaled: Mutex::new(false),
            condition: Condvar::new(),
        }
    }

    /// Signal the event, waking every thread currently waiting on it.
    ///
    /// Each waiter that observes the signal resets it before returning, so a burst
    /// of waiters racing `wait` will only ever have one of them actually consume
    /// a given `set` — the rest block again. This matches the spec's requirement
    /// that waiters always re-check state after waking rather than assume the
    /// condition they were waiting for is now true.
    pub fn set(&self) {
        let mut guard = self.signaled.lock();
        *guard = true;
        self.condition.notify_all();
    }

    /// Block until the event is signaled, then consume the signal.
    pub fn wait(&self) {
        let mut guard = self.signaled.lock();
        while !*guard {
            self.condition.wait(&mut guard);
        }
        *guard = false;
    }

    /// Block until the event is signaled or `timeout` elapses.
    ///
    /// Returns `true` if the event was consumed, `false` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut guard = self.signaled.lock();
        if !*guard {
            let result = self.condition.wait_for(&mut guard, timeout);
            if result.timed_out() && !*guard {
                return false;
            }
        }
        if *guard {
            *guard = false;
            true
        } else {
            false
        }
    }

    /// Block while `predicate` holds, re-evaluating it every time this event
    /// is signaled.
    ///
    /// Unlike `wait`, this does not consume `signaled` -- any number of
    /// waiters can share one event without starving each other, since `set`'s
    /// `notify_all` wakes every one of them and each re-checks its own
    /// predicate instead of racing to claim a single flag. This is what the
    /// dispatcher's shared `ready_signal`/`completion_signal` need: many
    /// workers (or producers) wait on the same event for different slots, and
    /// a single `set()` must wake all of them, not just whichever one got to
    /// the mutex first.
    pub fn wait_while<F: FnMut() -> bool>(&self, mut predicate: F) {
        let mut guard = self.signaled.lock();
        while predicate() {
            self.condition.wait(&mut guard);
        }
    }
}

impl Default for AutoResetEvent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_set_then_wait_does_not_block() {
        let event = AutoResetEvent::new();
        event.set();
        event.wait();
    }

    #[test]
    fn test_wait_timeout_without_signal() {
        let event = AutoResetEvent::new();
        assert!(!event.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_cross_thread_wakeup() {
        let event = Arc::new(AutoResetEvent::new());
        let waiter = event.clone();
        let handle = thread::spawn(move || {
            waiter.wait();
        });
        thread::sleep(Duration::from_millis(20));
        event.set();
        handle.join().unwrap();
    }

    #[test]
    fn test_signal_is_consumed_once() {
        let event = Arc::new(AutoResetEvent::new());
        event.set();
        event.wait();
        assert!(!event.wait_timeout(Duration::from_millis(10)));
    }
}
