//! Finalize item: waits for a KDF batch to have no outstanding derivations,
//! then wipes and frees the sensitive buffers the batch was guarding.
//!
//! The distilled contract this replaces ends with "destroy the two
//! caller-owned signal objects... free the counter storage" -- a manual
//! memory-management step. In this port those handles are `Arc`s; once the
//! `FinalizePayload` executing this item is dropped (the slot's payload is
//! replaced the next time the slot is reused), the last strong reference
//! goes with it. No explicit destroy call is needed or provided.

use crate::slot::FinalizePayload;

/// Execute one finalize item: block on the batch's completion, then wipe the
/// sensitive buffers it references. `Zeroizing` buffers wipe themselves on
/// drop, so this function's only job is to wait and then let them go out of
/// scope.
pub fn run(payload: &FinalizePayload) {
    payload.no_outstanding_event.wait();
    // `key_info`/`kdf_items` are `Zeroizing<Vec<u8>>`; dropping `payload`
    // (which happens when the slot's payload is overwritten on reuse) wipes
    // and frees them. Nothing further to do here.
}
