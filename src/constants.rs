//! Pool sizing and cryptographic buffer size constants.
//!
//! Mirrors the capacity table the dispatcher uses to size itself at `start()`: a
//! single-processor-group host gets the smaller table, a multi-group host (more than
//! 64 logical CPUs grouped by the platform) gets the larger one.

/// Maximum worker threads on a single-processor-group host.
pub const MAX_THREADS_SINGLE_GROUP: usize = 64;

/// Queue slots on a single-processor-group host (`2 * MAX_THREADS_SINGLE_GROUP`).
pub const QUEUE_SIZE_SINGLE_GROUP: usize = 2 * MAX_THREADS_SINGLE_GROUP;

/// Maximum worker threads on a multi-processor-group host.
pub const MAX_THREADS_MULTI_GROUP: usize = 256;

/// Queue slots on a multi-processor-group host (`2 * MAX_THREADS_MULTI_GROUP`).
pub const QUEUE_SIZE_MULTI_GROUP: usize = 2 * MAX_THREADS_MULTI_GROUP;

/// Fixed size, in bytes, of one data unit processed by the cipher engine.
pub const DATA_UNIT_SIZE: usize = 512;

/// Salt length, in bytes, supplied to every KDF invocation.
pub const SALT_LEN: usize = 64;

/// Largest derived-key length any supported hash family or KDF may produce.
pub const MAX_KDF_OUTPUT_LEN: usize = 64;

/// Cache line size used to pad the slot state word against false sharing.
pub const CACHE_LINE_SIZE: usize = 64;

// Compile-time guards on the relationships `validate_constants` re-checks at
// runtime for test diagnostics -- these catch an inconsistent edit before the
// crate even builds.
static_assertions::const_assert_eq!(QUEUE_SIZE_SINGLE_GROUP, 2 * MAX_THREADS_SINGLE_GROUP);
static_assertions::const_assert_eq!(QUEUE_SIZE_MULTI_GROUP, 2 * MAX_THREADS_MULTI_GROUP);
static_assertions::const_assert!(DATA_UNIT_SIZE.is_power_of_two());
static_assertions::const_assert!(SALT_LEN > 0);
static_assertions::const_assert!(MAX_KDF_OUTPUT_LEN > 0);
static_assertions::const_assert!(CACHE_LINE_SIZE.is_power_of_two());

/// Returns the `(max_threads, queue_size)` capacity table for a host with
/// `processor_group_count` active processor groups.
pub fn capacity_table(processor_group_count: usize) -> (usize, usize) {
    if processor_group_count > 1 {
        (MAX_THREADS_MULTI_GROUP, QUEUE_SIZE_MULTI_GROUP)
    } else {
        (MAX_THREADS_SINGLE_GROUP, QUEUE_SIZE_SINGLE_GROUP)
    }
}

/// Validate that the fixed size relationships the rest of the crate assumes hold.
///
/// Exercised at crate init in debug builds and by `tests::test_constants_validation`;
/// these are invariants of the capacity table, not runtime configuration, so a
/// violation here can only mean the constants above were edited inconsistently.
pub fn validate_constants() -> Result<(), &'static str> {
    if !QUEUE_SIZE_SINGLE_GROUP.is_power_of_two() {
        return Err("QUEUE_SIZE_SINGLE_GROUP must be a power of 2");
    }
    if !QUEUE_SIZE_MULTI_GROUP.is_power_of_two() {
        return Err("QUEUE_SIZE_MULTI_GROUP must be a power of 2");
    }
    if QUEUE_SIZE_SINGLE_GROUP != 2 * MAX_THREADS_SINGLE_GROUP {
        return Err("QUEUE_SIZE_SINGLE_GROUP must be twice MAX_THREADS_SINGLE_GROUP");
    }
    if QUEUE_SIZE_MULTI_GROUP != 2 * MAX_THREADS_MULTI_GROUP {
        return Err("QUEUE_SIZE_MULTI_GROUP must be twice MAX_THREADS_MULTI_GROUP");
    }
    if DATA_UNIT_SIZE == 0 || !DATA_UNIT_SIZE.is_power_of_two() {
        return Err("DATA_UNIT_SIZE must be a nonzero power of 2");
    }
    if SALT_LEN == 0 {
        return Err("SALT_LEN must be greater than 0");
    }
    if MAX_KDF_OUTPUT_LEN == 0 {
        return Err("MAX_KDF_OUTPUT_LEN must be greater than 0");
    }
    if CACHE_LINE_SIZE == 0 || !CACHE_LINE_SIZE.is_power_of_two() {
        return Err("CACHE_LINE_SIZE must be a power of 2");
    }
    Ok(())
}
