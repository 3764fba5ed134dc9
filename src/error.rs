//! Error types for the dispatch engine.
//!
//! The hot path (dispatch, KDF enqueue, finalize enqueue) has no fallible return —
//! invariant violations there are programmer errors and panic rather than propagate
//! (see the worker loop's handling of an unrecognized slot kind). `PoolStartError` is
//! the one condition a caller is expected to handle, since thread spawning is the one
//! failure mode that depends on host state rather than programmer error.

use thiserror::Error;

/// Result alias for the one fallible operation the pool exposes.
pub type Result<T> = std::result::Result<T, PoolStartError>;

/// Reasons `Pool::start` can fail to bring workers up.
#[derive(Error, Debug)]
pub enum PoolStartError {
    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn worker thread {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    /// `start` was called on a pool that is already running.
    #[error("pool is already running")]
    AlreadyRunning,
}
