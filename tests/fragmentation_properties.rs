//! Property tests over the fragmentation and ordering invariants
//! `Pool::dispatch_bulk` is built on: every unit is covered exactly once, and
//! the queue's claim-order discipline does not depend on start-unit choice.

use std::sync::Arc;

use cryptopool::cipher::{CipherEngine, XorStreamCipher};
use cryptopool::config::PoolConfig;
use cryptopool::constants::DATA_UNIT_SIZE;
use cryptopool::pool::{BulkKind, Pool};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// For unit_count in [1, 2000] and thread_count in [2, 16], a bulk
    /// encrypt followed by a bulk decrypt with the same cipher reproduces
    /// the original buffer -- every unit was covered by exactly one
    /// fragment regardless of how the work was split.
    #[test]
    fn fragmentation_covers_every_unit(
        unit_count in 1usize..2000,
        thread_count in 2usize..16,
    ) {
        let pool = Pool::new();
        prop_assert!(pool.start(PoolConfig::new().with_cpu_count_override(thread_count)));

        let cipher: Arc<dyn CipherEngine> = Arc::new(XorStreamCipher::new(vec![0x3C; 24]));
        let mut data = vec![0u8; unit_count * DATA_UNIT_SIZE];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i % 256) as u8;
        }
        let original = data.clone();

        pool.dispatch_bulk(BulkKind::Encrypt, &mut data, 0, unit_count, cipher.clone());
        pool.dispatch_bulk(BulkKind::Decrypt, &mut data, 0, unit_count, cipher);

        prop_assert_eq!(data, original);
        pool.stop();
    }

    /// Order independence: encrypting the same logical buffer through a
    /// pool sized for many workers and through one sized for exactly two
    /// must still produce byte-identical ciphertext, since fragment
    /// placement never changes the semantics of a data-unit-aligned
    /// stream cipher.
    #[test]
    fn fragment_count_does_not_change_result(
        unit_count in 1usize..500,
    ) {
        let cipher: Arc<dyn CipherEngine> = Arc::new(XorStreamCipher::new(vec![0x9F; 24]));

        let small_pool = Pool::new();
        prop_assert!(small_pool.start(PoolConfig::new().with_cpu_count_override(2)));
        let mut via_small = vec![5u8; unit_count * DATA_UNIT_SIZE];
        small_pool.dispatch_bulk(BulkKind::Encrypt, &mut via_small, 0, unit_count, cipher.clone());
        small_pool.stop();

        let large_pool = Pool::new();
        prop_assert!(large_pool.start(PoolConfig::new().with_cpu_count_override(16)));
        let mut via_large = vec![5u8; unit_count * DATA_UNIT_SIZE];
        large_pool.dispatch_bulk(BulkKind::Encrypt, &mut via_large, 0, unit_count, cipher);
        large_pool.stop();

        prop_assert_eq!(via_small, via_large);
    }
}
