//! Pool lifecycle and the six operations the engine exposes to callers:
//! `start`, `stop`, `is_running`/`thread_count`/`max_thread_count`,
//! `dispatch_bulk`, `begin_kdf`, `begin_finalize`.

use crate::config::PoolConfig;
use crate::constants::{capacity_table, DATA_UNIT_SIZE, SALT_LEN};
use crate::dispatcher::Dispatcher;
use crate::error::PoolStartError;
use crate::kdf::HashFamily;
use crate::platform::{self, distribute_workers, CpuTopology};
use crate::slot::{CryptoPayload, FinalizePayload, KdfPayload, Payload, SlotState, WorkKind};
use crate::sync::AutoResetEvent;
use crate::worker::{self, WorkerContext};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info};

/// Which bulk operation to run: plain dispatch on the caller thread for
/// trivial cases, or fragmented across the pool otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkKind {
    Encrypt,
    Decrypt,
}

struct PoolInner {
    dispatcher: Arc<Dispatcher>,
    topology: Arc<dyn CpuTopology>,
    workers: Vec<JoinHandle<()>>,
    thread_count: usize,
    max_thread_count: usize,
}

/// The fixed-capacity work-dispatch engine.
pub struct Pool {
    inner: Mutex<Option<PoolInner>>,
}

impl Pool {
    pub fn new() -> Self {
        Self { inner: Mutex::new(None) }
    }

    /// Bring the pool up. Returns `true` on success -- including the
    /// trivial case where the host has too few usable CPUs to be worth
    /// starting any workers, in which case `dispatch_bulk` always runs on
    /// the caller's thread and `begin_kdf`/`begin_finalize` must not be
    /// called. Returns `false` only if worker threads could not be spawned;
    /// the underlying cause is logged, not returned to the caller.
    pub fn start(&self, config: PoolConfig) -> bool {
        match self.try_start(config) {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, "pool failed to start");
                false
            }
        }
    }

    fn try_start(&self, config: PoolConfig) -> Result<bool, PoolStartError> {
        let mut guard = self.inner.lock();
        if guard.is_some() {
            return Err(PoolStartError::AlreadyRunning);
        }

        let topology: Arc<dyn CpuTopology> = Arc::from(platform::default_topology());
        let group_count = topology.processor_group_count();
        let (max_threads, queue_size) = capacity_table(group_count);
        let cpu_count = config.cpu_count_override.unwrap_or_else(|| topology.cpu_count());

        if cpu_count <= config.free_cpu_count {
            info!("too few CPUs available, pool will run bulk dispatch inline");
            return Ok(true);
        }
        let effective = (cpu_count - config.free_cpu_count).min(max_threads);
        if effective < 2 {
            info!(effective, "too few usable CPUs, pool will run bulk dispatch inline");
            return Ok(true);
        }

        let dispatcher = Arc::new(Dispatcher::new(queue_size));
        let group_cpu_counts: Vec<usize> = (0..group_count.max(1))
            .map(|g| topology.group_cpu_count(g))
            .collect();
        let placements = distribute_workers(effective, &group_cpu_counts);

        let mut workers = Vec::with_capacity(effective);
        for i in 0..effective {
            let worker_dispatcher = dispatcher.clone();
            let worker_topology = topology.clone();
            let placement = placements.get(i).copied();
            let spawned = thread::Builder::new()
                .name(format!("cryptopool-worker-{i}"))
                .spawn(move || worker::run(worker_dispatcher, worker_topology, WorkerContext { index: i, placement }));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(source) => {
                    // Leave no partial pool running: stop and join whatever
                    // was already spawned before surfacing the error.
                    dispatcher.request_stop();
                    dispatcher.ready_signal.set();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(PoolStartError::Spawn { index: i, source });
                }
            }
        }

        info!(thread_count = effective, max_thread_count = max_threads, "pool started");
        *guard = Some(PoolInner {
            dispatcher,
            topology,
            workers,
            thread_count: effective,
            max_thread_count: max_threads,
        });
        Ok(true)
    }

    /// Stop the pool, joining every worker thread. Idempotent.
    pub fn stop(&self) {
        let mut guard = self.inner.lock();
        if let Some(inner) = guard.take() {
            inner.dispatcher.request_stop();
            inner.dispatcher.ready_signal.set();
            for handle in inner.workers {
                let _ = handle.join();
            }
            info!("pool stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().is_some()
    }

    pub fn thread_count(&self) -> usize {
        self.inner.lock().as_ref().map(|inner| inner.thread_count).unwrap_or(0)
    }

    pub fn max_thread_count(&self) -> usize {
        self.inner.lock().as_ref().map(|inner| inner.max_thread_count).unwrap_or(0)
    }

    fn dispatcher(&self) -> Option<Arc<Dispatcher>> {
        self.inner.lock().as_ref().map(|inner| inner.dispatcher.clone())
    }

    fn wait_slot_free(&self, dispatcher: &Dispatcher, slot_index: usize) {
        let slot = dispatcher.queue.slot(slot_index);
        dispatcher.completion_signal.wait_while(|| slot.state() != SlotState::Free);
    }

    /// Encrypt or decrypt `unit_count` data units starting at `start_unit`,
    /// fragmenting the work across the pool's workers and blocking until
    /// every fragment completes. `data` must be exactly
    /// `unit_count * DATA_UNIT_SIZE` bytes.
    pub fn dispatch_bulk(
        &self,
        kind: BulkKind,
        data: &mut [u8],
        start_unit: u64,
        unit_count: usize,
        cipher: Arc<dyn crate::cipher::CipherEngine>,
    ) {
        if unit_count == 0 {
            return;
        }
        debug_assert_eq!(data.len(), unit_count * DATA_UNIT_SIZE);

        let thread_count = self.thread_count();
        let dispatcher = if thread_count >= 2 && unit_count > 1 { self.dispatcher() } else { None };

        let dispatcher = match dispatcher {
            Some(d) => d,
            None => {
                match kind {
                    BulkKind::Encrypt => cipher.encrypt_units(data, start_unit, unit_count),
                    BulkKind::Decrypt => cipher.decrypt_units(data, start_unit, unit_count),
                }
                return;
            }
        };

        let fragment_count = unit_count.min(thread_count);
        let base_units = unit_count / fragment_count;
        let remainder = unit_count % fragment_count;
        let work_kind = match kind {
            BulkKind::Encrypt => WorkKind::EncryptUnits,
            BulkKind::Decrypt => WorkKind::DecryptUnits,
        };

        let mut cursor = dispatcher.queue.lock_enqueue_cursor();
        let leader_index = *cursor;
        self.wait_slot_free(&dispatcher, leader_index);
        dispatcher.queue.slot(leader_index).set_outstanding_fragments(fragment_count);

        let mut current_start = start_unit;
        let mut data_offset = 0usize;
        for fragment in 0..fragment_count {
            let slot_index = *cursor;
            self.wait_slot_free(&dispatcher, slot_index);
            let slot = dispatcher.queue.slot(slot_index);

            let this_units = if fragment < remainder { base_units + 1 } else { base_units };
            let fragment_data = unsafe { data.as_mut_ptr().add(data_offset) };

            unsafe {
                slot.fill(
                    work_kind,
                    leader_index,
                    Payload::Crypto(CryptoPayload {
                        data: fragment_data,
                        unit_count: this_units,
                        start_unit: current_start,
                        cipher: cipher.clone(),
                    }),
                );
            }
            slot.publish();
            dispatcher.ready_signal.set();

            data_offset += this_units * DATA_UNIT_SIZE;
            current_start += this_units as u64;
            dispatcher.queue.advance(&mut cursor);
        }
        drop(cursor);

        let leader_slot = dispatcher.queue.slot(leader_index);
        leader_slot.completion_event.wait();
        leader_slot.release();
        dispatcher.completion_signal.set();
    }

    /// Enqueue one key-derivation request. Returns immediately; completion is
    /// observed via `completion_event`/`completion_flag` (per-item) or
    /// `no_outstanding_event` (per-batch, once `outstanding_count` reaches
    /// zero). The derived key is written into `derived_key_out` -- sized to
    /// the desired output length by the caller before enqueueing -- and is
    /// only safe to read once `completion_flag` is observed set. The pool
    /// must be running -- calling this while stopped is a programmer error
    /// and panics.
    #[allow(clippy::too_many_arguments)]
    pub fn begin_kdf(
        &self,
        family: HashFamily,
        password: Vec<u8>,
        salt: [u8; SALT_LEN],
        iterations: u32,
        memory_cost_kib: Option<u32>,
        derived_key_out: Arc<parking_lot::Mutex<Vec<u8>>>,
        completion_event: Arc<AutoResetEvent>,
        completion_flag: Arc<AtomicU8>,
        outstanding_count: Arc<AtomicUsize>,
        no_outstanding_event: Arc<AutoResetEvent>,
        abort_flag: Arc<AtomicBool>,
    ) {
        let dispatcher = self.dispatcher().expect("begin_kdf called while pool is not running");
        assert!(
            derived_key_out.lock().len() <= crate::constants::MAX_KDF_OUTPUT_LEN,
            "requested KDF output length exceeds MAX_KDF_OUTPUT_LEN"
        );

        outstanding_count.fetch_add(1, Ordering::AcqRel);

        let mut cursor = dispatcher.queue.lock_enqueue_cursor();
        let slot_index = *cursor;
        self.wait_slot_free(&dispatcher, slot_index);
        let slot = dispatcher.queue.slot(slot_index);

        unsafe {
            slot.fill(
                WorkKind::DeriveKey,
                slot_index,
                Payload::Kdf(KdfPayload {
                    password,
                    salt,
                    iterations,
                    memory_cost_kib,
                    family,
                    derived_key_out,
                    completion_event,
                    completion_flag,
                    outstanding_count,
                    no_outstanding_event,
                    abort_flag,
                }),
            );
        }
        slot.publish();
        dispatcher.queue.advance(&mut cursor);
        drop(cursor);
        dispatcher.ready_signal.set();
    }

    /// Enqueue a finalize item that waits for `no_outstanding_event`, then
    /// wipes and frees `key_info`/`kdf_items`. `outstanding_count` is the same
    /// shared counter the batch's `begin_kdf` calls incremented -- this item
    /// holds the handle so it is released once the batch is torn down.
    pub fn begin_finalize(
        &self,
        no_outstanding_event: Arc<AutoResetEvent>,
        outstanding_count: Arc<AtomicUsize>,
        key_info: Option<zeroize::Zeroizing<Vec<u8>>>,
        kdf_items: Option<zeroize::Zeroizing<Vec<u8>>>,
    ) {
        let dispatcher = self.dispatcher().expect("begin_finalize called while pool is not running");

        let mut cursor = dispatcher.queue.lock_enqueue_cursor();
        let slot_index = *cursor;
        self.wait_slot_free(&dispatcher, slot_index);
        let slot = dispatcher.queue.slot(slot_index);

        unsafe {
            slot.fill(
                WorkKind::Finalize,
                slot_index,
                Payload::Finalize(FinalizePayload { no_outstanding_event, outstanding_count, key_info, kdf_items }),
            );
        }
        slot.publish();
        dispatcher.queue.advance(&mut cursor);
        drop(cursor);
        dispatcher.ready_signal.set();
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::XorStreamCipher;

    fn test_cipher() -> Arc<dyn crate::cipher::CipherEngine> {
        Arc::new(XorStreamCipher::new(vec![0x42; 32]))
    }

    #[test]
    fn test_trivial_dispatch_without_starting_pool() {
        let pool = Pool::new();
        let mut data = vec![1u8; DATA_UNIT_SIZE];
        pool.dispatch_bulk(BulkKind::Encrypt, &mut data, 0, 1, test_cipher());
        assert_ne!(data, vec![1u8; DATA_UNIT_SIZE]);
    }

    #[test]
    fn test_start_stop_idempotent() {
        let pool = Pool::new();
        assert!(pool.start(PoolConfig::new().with_cpu_count_override(4)));
        assert!(pool.is_running());
        pool.stop();
        assert!(!pool.is_running());
        pool.stop();
    }

    #[test]
    fn test_single_cpu_host_runs_inline() {
        let pool = Pool::new();
        assert!(pool.start(PoolConfig::new().with_cpu_count_override(1)));
        assert!(!pool.is_running());
        let mut data = vec![9u8; DATA_UNIT_SIZE * 4];
        pool.dispatch_bulk(BulkKind::Encrypt, &mut data, 0, 4, test_cipher());
    }

    #[test]
    fn test_bulk_round_trip_across_workers() {
        let pool = Pool::new();
        assert!(pool.start(PoolConfig::new().with_cpu_count_override(4)));

        let cipher = test_cipher();
        let unit_count = 37;
        let mut data = vec![0u8; unit_count * DATA_UNIT_SIZE];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i % 256) as u8;
        }
        let original = data.clone();

        pool.dispatch_bulk(BulkKind::Encrypt, &mut data, 0, unit_count, cipher.clone());
        assert_ne!(data, original);

        pool.dispatch_bulk(BulkKind::Decrypt, &mut data, 0, unit_count, cipher);
        assert_eq!(data, original);

        pool.stop();
    }

    #[test]
    fn test_kdf_batch_completion_and_finalize() {
        let pool = Pool::new();
        assert!(pool.start(PoolConfig::new().with_cpu_count_override(4)));

        let no_outstanding_event = Arc::new(AutoResetEvent::new());
        let outstanding_count = Arc::new(AtomicUsize::new(0));
        let abort_flag = Arc::new(AtomicBool::new(false));

        let families = [HashFamily::Sha256, HashFamily::Sha512, HashFamily::Blake2s];
        let mut completion_events = Vec::new();
        let mut completion_flags = Vec::new();
        let mut derived_keys = Vec::new();

        for family in families {
            let completion_event = Arc::new(AutoResetEvent::new());
            let completion_flag = Arc::new(AtomicU8::new(0));
            let derived_key_out = Arc::new(parking_lot::Mutex::new(vec![0u8; 32]));
            pool.begin_kdf(
                family,
                b"password".to_vec(),
                [7u8; SALT_LEN],
                1000,
                None,
                derived_key_out.clone(),
                completion_event.clone(),
                completion_flag.clone(),
                outstanding_count.clone(),
                no_outstanding_event.clone(),
                abort_flag.clone(),
            );
            completion_events.push(completion_event);
            completion_flags.push(completion_flag);
            derived_keys.push(derived_key_out);
        }

        for event in &completion_events {
            event.wait();
        }
        for flag in &completion_flags {
            assert_eq!(flag.load(Ordering::Acquire), 1);
        }
        for derived_key in &derived_keys {
            assert_ne!(*derived_key.lock(), vec![0u8; 32]);
        }

        pool.begin_finalize(no_outstanding_event, outstanding_count, None, None);
        pool.stop();
    }
}
