//! Dispatcher: owns the ring queue and the two signals every producer and
//! worker shares — one pulsed whenever a slot becomes `Ready`, one pulsed
//! whenever a slot becomes `Free`.
//!
//! Both signals are auto-reset and shared by every waiter rather than per-slot,
//! because a producer waiting for *some* slot to free up, or a worker waiting
//! for *some* slot to become ready, does not know in advance which slot it will
//! be; each waiter re-checks its own target slot after waking.

use crate::queue::RingQueue;
use crate::sync::AutoResetEvent;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct Dispatcher {
    pub queue: RingQueue,
    pub ready_signal: AutoResetEvent,
    pub completion_signal: AutoResetEvent,
    pub stop_pending: AtomicBool,
}

impl Dispatcher {
    pub fn new(queue_size: usize) -> Self {
        Self {
            queue: RingQueue::new(queue_size),
            ready_signal: AutoResetEvent::new(),
            completion_signal: AutoResetEvent::new(),
            stop_pending: AtomicBool::new(false),
        }
    }

    pub fn is_stop_pending(&self) -> bool {
        self.stop_pending.load(Ordering::Acquire)
    }

    pub fn request_stop(&self) {
        self.stop_pending.store(true, Ordering::Release);
    }
}
