//! Hash functions used to position vnodes and keys on the ring.
//!
//! All placement decisions go through [`RingHasher`], so the ring can be
//! driven by any deterministic 64-bit hash. The default is xxHash64, a fast
//! non-cryptographic hash with good avalanche behaviour.

use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

/// A deterministic mapping from bytes to a ring position.
///
/// Implementations must be pure: the same input yields the same output for
/// the lifetime of the process, with no observable side effects.
pub trait RingHasher: Send + Sync {
    /// Hash `key` to a position on the `u64` ring.
    fn hash(&self, key: &[u8]) -> u64;
}

/// xxHash64 with seed 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XxHasher;

impl RingHasher for XxHasher {
    fn hash(&self, key: &[u8]) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(key);
        hasher.finish()
    }
}

/// BLAKE3 truncated to its first 8 bytes (little endian).
///
/// Slower than [`XxHasher`] but stable across platforms and library
/// versions by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3Hasher;

impl RingHasher for Blake3Hasher {
    fn hash(&self, key: &[u8]) -> u64 {
        let digest = blake3::hash(key);
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }
}

/// Hash function selected by name, e.g. from a config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HasherKind {
    /// [`XxHasher`].
    #[default]
    #[serde(alias = "xxhash64")]
    Xxhash,
    /// [`Blake3Hasher`].
    Blake3,
}

impl RingHasher for HasherKind {
    fn hash(&self, key: &[u8]) -> u64 {
        match self {
            Self::Xxhash => XxHasher.hash(key),
            Self::Blake3 => Blake3Hasher.hash(key),
        }
    }
}

impl<T: RingHasher + ?Sized> RingHasher for &T {
    fn hash(&self, key: &[u8]) -> u64 {
        (**self).hash(key)
    }
}
