//! Ring queue slot: the three-state coordination unit producers and workers
//! hand work through.
//!
//! A slot's payload is written only while its state is `Free` (by the producer
//! about to flip it to `Ready`) or read/executed only while `Busy` (by the worker
//! that claimed it) — never concurrently by two parties, except for
//! `outstanding_fragments`, which every fragment's worker decrements while the
//! leader itself sits `Busy`. That field therefore lives in its own atomic rather
//! than inside the `UnsafeCell` payload.

use crate::constants::SALT_LEN;
use crate::sync::AutoResetEvent;
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

/// Slot lifecycle state. Transitions: `Free -> Ready` (producer),
/// `Ready -> Busy` (worker), `Busy -> Free` (worker, except a fragment leader's
/// slot, which the producer frees after observing its completion event).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SlotState {
    Free = 0,
    Ready = 1,
    Busy = 2,
}

impl SlotState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SlotState::Free,
            1 => SlotState::Ready,
            2 => SlotState::Busy,
            _ => unreachable!("invalid slot state byte {v}"),
        }
    }
}

/// Which operation a slot's payload describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkKind {
    EncryptUnits,
    DecryptUnits,
    DeriveKey,
    Finalize,
}

/// A bulk-crypto fragment: a borrowed slice of the caller's buffer plus the
/// starting data-unit number within it and the cipher context to run against it.
///
/// `data` is a raw pointer rather than a borrowed slice because the slot itself
/// is `'static` (it lives inside the pool's boxed array for the pool's lifetime)
/// while the buffer it points at is only valid for the duration of one
/// `dispatch_bulk` call; the producer's wait on the leader's completion event is
/// what upholds that the pointer does not outlive the call.
pub struct CryptoPayload {
    pub data: *mut u8,
    pub unit_count: usize,
    pub start_unit: u64,
    pub cipher: Arc<dyn crate::cipher::CipherEngine>,
}

unsafe impl Send for CryptoPayload {}

/// A key-derivation request. `derived_key_out` is caller-owned (the volume-header
/// prober reads it back after observing `completion_flag`) -- the slot only ever
/// borrows it through the `Arc`, it never becomes the buffer's owner, so the
/// result survives the slot being recycled for the next KDF dispatch.
pub struct KdfPayload {
    pub password: Vec<u8>,
    pub salt: [u8; SALT_LEN],
    pub iterations: u32,
    pub memory_cost_kib: Option<u32>,
    pub family: crate::kdf::HashFamily,
    pub derived_key_out: Arc<parking_lot::Mutex<Vec<u8>>>,
    pub completion_event: Arc<AutoResetEvent>,
    pub completion_flag: Arc<AtomicU8>,
    pub outstanding_count: Arc<AtomicUsize>,
    pub no_outstanding_event: Arc<AutoResetEvent>,
    pub abort_flag: Arc<std::sync::atomic::AtomicBool>,
}

/// A finalize request: wait for a batch's `no_outstanding_event`, then wipe and
/// drop the sensitive buffers it was guarding. `outstanding_count` is carried
/// here purely so the batch's shared counter handle is released (its `Arc`
/// dropped) alongside the other caller-owned signal objects once this item
/// finishes, rather than living on past the batch it belonged to.
pub struct FinalizePayload {
    pub no_outstanding_event: Arc<AutoResetEvent>,
    pub outstanding_count: Arc<AtomicUsize>,
    pub key_info: Option<zeroize::Zeroizing<Vec<u8>>>,
    pub kdf_items: Option<zeroize::Zeroizing<Vec<u8>>>,
}

pub enum Payload {
    Crypto(CryptoPayload),
    Kdf(KdfPayload),
    Finalize(FinalizePayload),
    Empty,
}

/// One entry in the ring queue.
pub struct Slot {
    state: CachePadded<AtomicU8>,
    kind: UnsafeCell<WorkKind>,
    payload: UnsafeCell<Payload>,
    /// Index of the fragment leader this slot belongs to (itself, if it is the
    /// leader). Only meaningful for `EncryptUnits`/`DecryptUnits` slots.
    leader: UnsafeCell<usize>,
    /// Valid only on a leader slot: fragments remaining, including itself.
    outstanding_fragments: AtomicUsize,
    /// Per-slot completion signal, pulsed by whichever worker decrements a
    /// leader's `outstanding_fragments` to zero.
    pub completion_event: AutoResetEvent,
}

// SAFETY: every field but `outstanding_fragments` and `state` is guarded by the
// Free/Ready/Busy protocol — at most one of {producer, worker} may touch them at
// a time, and the `state` transition that hands off ownership carries the
// necessary acquire/release ordering. `outstanding_fragments` is itself atomic.
unsafe impl Sync for Slot {}

impl Slot {
    pub fn new() -> Self {
        Self {
            state: CachePadded::new(AtomicU8::new(SlotState::Free as u8)),
            kind: UnsafeCell::new(WorkKind::EncryptUnits),
            payload: UnsafeCell::new(Payload::Empty),
            leader: UnsafeCell::new(0),
            outstanding_fragments: AtomicUsize::new(0),
            completion_event: AutoResetEvent::new(),
        }
    }

    pub fn state(&self) -> SlotState {
        SlotState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Called by a producer holding the enqueue mutex, having observed `Free`.
    ///
    /// # Safety
    /// Caller must have observed `state() == SlotState::Free` before calling, and
    /// must not call this concurrently with another producer on the same slot
    /// (the enqueue mutex upholds this).
    pub unsafe fn fill(&self, kind: WorkKind, leader: usize, payload: Payload) {
        *self.kind.get() = kind;
        *self.leader.get() = leader;
        *self.payload.get() = payload;
    }

    /// Flip `Free -> Ready`, publishing the fields written by `fill`.
    pub fn publish(&self) {
        self.state.store(SlotState::Ready as u8, Ordering::Release);
    }

    /// Flip `Ready -> Busy`. Called by the worker holding the dequeue mutex.
    pub fn claim_for_execution(&self) {
        self.state.store(SlotState::Busy as u8, Ordering::Release);
    }

    /// Flip `Busy -> Free`. Called by the worker after execution, except for a
    /// fragment leader, whose producer frees it once the completion event fires.
    pub fn release(&self) {
        self.state.store(SlotState::Free as u8, Ordering::Release);
    }

    /// # Safety
    /// Caller must hold exclusive access implied by the slot being `Busy` and
    /// executing on the calling thread (i.e. this is the worker that claimed it).
    pub unsafe fn kind(&self) -> WorkKind {
        *self.kind.get()
    }

    /// # Safety
    /// Same contract as `kind`.
    pub unsafe fn leader_index(&self) -> usize {
        *self.leader.get()
    }

    /// # Safety
    /// Same contract as `kind`; the returned reference must not outlive the
    /// `Busy` phase.
    pub unsafe fn payload_mut(&self) -> &mut Payload {
        &mut *self.payload.get()
    }

    pub fn set_outstanding_fragments(&self, count: usize) {
        self.outstanding_fragments.store(count, Ordering::Release);
    }

    /// Decrement the leader's fragment counter; returns `true` if this call
    /// brought it to zero (i.e. this was the last fragment to finish).
    pub fn decrement_outstanding_fragments(&self) -> bool {
        self.outstanding_fragments.fetch_sub(1, Ordering::AcqRel) == 1
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_slot_is_free() {
        let slot = Slot::new();
        assert_eq!(slot.state(), SlotState::Free);
    }

    #[test]
    fn test_publish_then_claim_then_release_cycle() {
        let slot = Slot::new();
        unsafe {
            slot.fill(WorkKind::EncryptUnits, 0, Payload::Empty);
        }
        slot.publish();
        assert_eq!(slot.state(), SlotState::Ready);
        slot.claim_for_execution();
        assert_eq!(slot.state(), SlotState::Busy);
        slot.release();
        assert_eq!(slot.state(), SlotState::Free);
    }

    #[test]
    fn test_outstanding_fragments_reaches_zero_once() {
        let slot = Slot::new();
        slot.set_outstanding_fragments(3);
        assert!(!slot.decrement_outstanding_fragments());
        assert!(!slot.decrement_outstanding_fragments());
        assert!(slot.decrement_outstanding_fragments());
    }
}
