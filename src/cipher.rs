//! Cipher collaborator contracts.
//!
//! The actual data-unit cipher (and the optional RAM-encryption key unwrap
//! step ahead of it) are treated as pure CPU functions the pool invokes --
//! the pool does not know or care which cipher a `CipherEngine` wraps, only
//! that it can encrypt/decrypt disjoint data-unit ranges safely from any
//! worker thread concurrently.

use crate::constants::DATA_UNIT_SIZE;
use zeroize::Zeroize;

/// Encrypts/decrypts fixed-size data units. Implementations must be safe to
/// call concurrently from multiple worker threads provided the `data` ranges
/// given to each call are disjoint -- the pool relies on this to fragment a
/// single buffer across workers without additional synchronization.
pub trait CipherEngine: Send + Sync {
    /// Encrypt `unit_count` data units in place, starting at `start_unit`.
    fn encrypt_units(&self, data: &mut [u8], start_unit: u64, unit_count: usize);

    /// Decrypt `unit_count` data units in place, starting at `start_unit`.
    fn decrypt_units(&self, data: &mut [u8], start_unit: u64, unit_count: usize);
}

/// A key schedule that is kept RAM-encrypted at rest and must be unwrapped
/// into a plain, self-wiping snapshot before use. Each fragment's worker
/// performs its own unwrap/wipe cycle rather than sharing one snapshot, so
/// that no decrypted key schedule persists in memory any longer than the
/// single fragment being processed needs it.
pub trait RamEncryptionKeys: Send + Sync {
    /// Produce a freshly-unwrapped `CipherEngine` snapshot. The returned
    /// engine's key material is wiped when it is dropped.
    fn unwrap(&self) -> Box<dyn CipherEngine>;
}

/// A `CipherEngine` that runs its key schedule through a `RamEncryptionKeys`
/// unwrap for every fragment, per the spec's wipe-per-fragment contract.
pub struct RamEncryptedContext {
    keys: std::sync::Arc<dyn RamEncryptionKeys>,
}

impl RamEncryptedContext {
    pub fn new(keys: std::sync::Arc<dyn RamEncryptionKeys>) -> Self {
        Self { keys }
    }
}

impl CipherEngine for RamEncryptedContext {
    fn encrypt_units(&self, data: &mut [u8], start_unit: u64, unit_count: usize) {
        let snapshot = self.keys.unwrap();
        snapshot.encrypt_units(data, start_unit, unit_count);
    }

    fn decrypt_units(&self, data: &mut [u8], start_unit: u64, unit_count: usize) {
        let snapshot = self.keys.unwrap();
        snapshot.decrypt_units(data, start_unit, unit_count);
    }
}

/// XOR-with-keystream placeholder cipher, standing in for the out-of-scope
/// volume cipher. Not intended for real confidentiality -- it exists so the
/// dispatch engine has a concrete, testable `CipherEngine` without taking a
/// dependency on a specific disk-encryption cipher.
pub struct XorStreamCipher {
    key: Vec<u8>,
}

impl XorStreamCipher {
    pub fn new(key: Vec<u8>) -> Self {
        assert!(!key.is_empty(), "cipher key must not be empty");
        Self { key }
    }

    fn apply(&self, data: &mut [u8], start_unit: u64) {
        let unit_count = data.len() / DATA_UNIT_SIZE;
        for unit in 0..unit_count {
            let unit_index = start_unit + unit as u64;
            let base = unit * DATA_UNIT_SIZE;
            for i in 0..DATA_UNIT_SIZE {
                let key_byte = self.key[(i + unit_index as usize) % self.key.len()];
                data[base + i] ^= key_byte;
            }
        }
    }
}

impl CipherEngine for XorStreamCipher {
    fn encrypt_units(&self, data: &mut [u8], start_unit: u64, unit_count: usize) {
        debug_assert_eq!(data.len(), unit_count * DATA_UNIT_SIZE);
        self.apply(data, start_unit);
    }

    fn decrypt_units(&self, data: &mut [u8], start_unit: u64, unit_count: usize) {
        debug_assert_eq!(data.len(), unit_count * DATA_UNIT_SIZE);
        self.apply(data, start_unit);
    }
}

impl Drop for XorStreamCipher {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_cipher_round_trips() {
        let cipher = XorStreamCipher::new(vec![0xAA; 32]);
        let mut data = vec![0u8; DATA_UNIT_SIZE * 4];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i % 256) as u8;
        }
        let original = data.clone();

        cipher.encrypt_units(&mut data, 0, 4);
        assert_ne!(data, original);

        cipher.decrypt_units(&mut data, 0, 4);
        assert_eq!(data, original);
    }

    #[test]
    fn test_xor_cipher_disjoint_fragments_agree_with_whole_buffer() {
        let cipher = XorStreamCipher::new(vec![0x5A; 16]);
        let mut whole = vec![7u8; DATA_UNIT_SIZE * 4];
        cipher.encrypt_units(&mut whole, 0, 4);

        let mut fragmented = vec![7u8; DATA_UNIT_SIZE * 4];
        {
            let (first_half, second_half) = fragmented.split_at_mut(DATA_UNIT_SIZE * 2);
            cipher.encrypt_units(first_half, 0, 2);
            cipher.encrypt_units(second_half, 2, 2);
        }

        assert_eq!(whole, fragmented);
    }
}
