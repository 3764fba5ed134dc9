//! Fixed-capacity ring queue: slots plus two independently-guarded cursors.
//!
//! Enqueue and dequeue never contend on the same lock — a producer claiming the
//! next write slot and a worker claiming the next read slot touch different
//! mutexes. The only sharing between them is through the slot's own state word.

use crate::slot::Slot;
use parking_lot::Mutex;

/// Ring queue of fixed-capacity slots with independent enqueue/dequeue cursors.
pub struct RingQueue {
    slots: Box<[Slot]>,
    enqueue_cursor: Mutex<usize>,
    dequeue_cursor: Mutex<usize>,
}

impl RingQueue {
    pub fn new(size: usize) -> Self {
        let mut slots = Vec::with_capacity(size);
        for _ in 0..size {
            slots.push(Slot::new());
        }
        Self {
            slots: slots.into_boxed_slice(),
            enqueue_cursor: Mutex::new(0),
            dequeue_cursor: Mutex::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    /// Lock the enqueue cursor and return it, for a producer about to claim one
    /// or more consecutive slots under a single critical section (bulk crypto
    /// claims its whole fragment set this way so the leader is visible before
    /// any follower is).
    pub fn lock_enqueue_cursor(&self) -> parking_lot::MutexGuard<'_, usize> {
        self.enqueue_cursor.lock()
    }

    /// Lock the dequeue cursor and return it, for a worker about to claim the
    /// next slot to execute.
    pub fn lock_dequeue_cursor(&self) -> parking_lot::MutexGuard<'_, usize> {
        self.dequeue_cursor.lock()
    }

    /// Advance a held cursor to the next index, modulo queue size.
    pub fn advance(&self, cursor: &mut usize) -> usize {
        let claimed = *cursor;
        *cursor = (*cursor + 1) % self.slots.len();
        claimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotState;

    #[test]
    fn test_new_queue_all_slots_free() {
        let queue = RingQueue::new(8);
        for i in 0..8 {
            assert_eq!(queue.slot(i).state(), SlotState::Free);
        }
    }

    #[test]
    fn test_cursor_advance_wraps() {
        let queue = RingQueue::new(4);
        let mut cursor = queue.lock_enqueue_cursor();
        assert_eq!(queue.advance(&mut cursor), 0);
        assert_eq!(queue.advance(&mut cursor), 1);
        assert_eq!(queue.advance(&mut cursor), 2);
        assert_eq!(queue.advance(&mut cursor), 3);
        assert_eq!(*cursor, 0);
    }

    #[test]
    fn test_enqueue_and_dequeue_cursors_independent() {
        let queue = RingQueue::new(4);
        let mut enqueue = queue.lock_enqueue_cursor();
        queue.advance(&mut enqueue);
        drop(enqueue);

        let dequeue = queue.lock_dequeue_cursor();
        assert_eq!(*dequeue, 0);
    }
}
