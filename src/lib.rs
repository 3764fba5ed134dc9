//! Fixed-capacity, in-process work-dispatch engine for parallel volume
//! cryptography and password-based key derivation.
//!
//! The engine is a bounded MPMC ring queue of three-state slots (`Free` /
//! `Ready` / `Busy`) shared by a fixed pool of worker threads. Two work
//! lifecycles run through it: synchronous bulk sector encryption/decryption,
//! split into fragments under a leader/follower completion model
//! ([`Pool::dispatch_bulk`]), and asynchronous key derivation, where
//! completion is observed through caller-supplied signals and a shared
//! outstanding counter ([`Pool::begin_kdf`], [`Pool::begin_finalize`]).
//!
//! ## Logging
//!
//! The pool emits [`tracing`] events at start/stop and on worker-bind
//! failures. Wire up a subscriber in the host application to see them:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt::init();
//! ```

pub mod cipher;
pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod finalize;
pub mod kdf;
pub mod platform;
pub mod pool;
pub mod queue;
pub mod slot;
pub mod sync;
pub mod worker;

pub use cipher::{CipherEngine, RamEncryptionKeys, XorStreamCipher};
pub use config::PoolConfig;
pub use error::{PoolStartError, Result};
pub use kdf::HashFamily;
pub use pool::{BulkKind, Pool};
pub use sync::AutoResetEvent;

/// Crate version, as reported by Cargo.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
