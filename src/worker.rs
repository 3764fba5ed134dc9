//! Worker thread body: claim a slot, wait for it to become ready, execute its
//! payload according to `WorkKind`, recycle the slot.

use crate::dispatcher::Dispatcher;
use crate::platform::CpuPlacement;
use crate::slot::{Payload, SlotState, WorkKind};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-worker configuration threaded through at spawn time.
pub struct WorkerContext {
    pub index: usize,
    pub placement: Option<CpuPlacement>,
}

/// The worker's main loop, run on its own OS thread for the pool's lifetime.
pub fn run(dispatcher: Arc<Dispatcher>, topology: Arc<dyn crate::platform::CpuTopology>, ctx: WorkerContext) {
    if let Some(placement) = ctx.placement {
        if let Err(err) = topology.bind_current_thread(placement) {
            warn!(worker = ctx.index, error = %err, "failed to bind worker thread to CPU group");
        }
    }

    loop {
        let slot_index = {
            let mut cursor = dispatcher.queue.lock_dequeue_cursor();
            let claimed = dispatcher.queue.advance(&mut cursor);
            claimed
        };
        let slot = dispatcher.queue.slot(slot_index);

        dispatcher
            .ready_signal
            .wait_while(|| !dispatcher.is_stop_pending() && slot.state() != SlotState::Ready);
        if slot.state() != SlotState::Ready {
            // Woken by a stop request with nothing queued on this slot --
            // never abandon a slot that did turn `Ready` concurrently with
            // the stop, since its producer is waiting on its completion.
            return;
        }

        slot.claim_for_execution();

        // SAFETY: the slot is `Busy` and this is the worker thread that
        // claimed it via the dequeue cursor -- no other party may touch its
        // payload until this worker transitions it back to `Free` (or, for a
        // fragment leader, until the producer does so after this call).
        let kind = unsafe { slot.kind() };
        let leader_index = unsafe { slot.leader_index() };

        match kind {
            WorkKind::EncryptUnits | WorkKind::DecryptUnits => {
                let is_leader = leader_index == slot_index;
                let encrypt = kind == WorkKind::EncryptUnits;
                let payload = unsafe { slot.payload_mut() };
                if let Payload::Crypto(crypto) = payload {
                    let data = unsafe {
                        std::slice::from_raw_parts_mut(
                            crypto.data,
                            crypto.unit_count * crate::constants::DATA_UNIT_SIZE,
                        )
                    };
                    if encrypt {
                        crypto.cipher.encrypt_units(data, crypto.start_unit, crypto.unit_count);
                    } else {
                        crypto.cipher.decrypt_units(data, crypto.start_unit, crypto.unit_count);
                    }
                }

                let leader_slot = dispatcher.queue.slot(leader_index);
                if leader_slot.decrement_outstanding_fragments() {
                    leader_slot.completion_event.set();
                }

                if !is_leader {
                    slot.release();
                    dispatcher.completion_signal.set();
                }
                // The leader's own slot is freed by its producer, once the
                // producer observes `completion_event`.
            }
            WorkKind::DeriveKey => {
                let payload = unsafe { slot.payload_mut() };
                if let Payload::Kdf(kdf) = payload {
                    {
                        let mut derived_key_out = kdf.derived_key_out.lock();
                        crate::kdf::derive(
                            kdf.family,
                            &kdf.password,
                            &kdf.salt,
                            kdf.iterations,
                            kdf.memory_cost_kib,
                            &mut derived_key_out,
                            &kdf.abort_flag,
                        );
                    }

                    kdf.completion_flag.store(1, Ordering::Release);
                    kdf.completion_event.set();

                    if kdf.outstanding_count.fetch_sub(1, Ordering::AcqRel) == 1 {
                        kdf.no_outstanding_event.set();
                    }
                }
                slot.release();
                dispatcher.completion_signal.set();
            }
            WorkKind::Finalize => {
                let payload = unsafe { slot.payload_mut() };
                if let Payload::Finalize(finalize) = payload {
                    crate::finalize::run(finalize);
                }
                slot.release();
                dispatcher.completion_signal.set();
            }
        }

        debug!(worker = ctx.index, slot = slot_index, ?kind, "slot processed");
    }
}
