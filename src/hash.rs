//! djb2 string hashing used for bucket placement and interner lookup.
//!
//! Not cryptographic and not stable across crate versions; only stable
//! within one process run.

const DJB2_SEED: u64 = 5381;

/// `h = h * 33 + byte` over every byte, starting from 5381.
#[inline]
pub fn djb2(bytes: &[u8]) -> u64 {
    bytes.iter().fold(DJB2_SEED, |h, &c| {
        (h << 5).wrapping_add(h).wrapping_add(u64::from(c))
    })
}

#[inline]
pub fn hash_str(s: &str) -> u64 {
    djb2(s.as_bytes())
}

/// Fold low bits upward for tables that read the top bits (hashbrown's
/// control tag uses the high 7). Short keys never reach them under djb2.
#[inline]
pub(crate) fn spread(hash: u64) -> u64 {
    hash.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Bucket index for `hash` in a table of `bucket_count` chains.
#[inline]
pub fn bucket_for(hash: u64, bucket_count: usize) -> usize {
    debug_assert!(bucket_count > 0);
    (hash % bucket_count as u64) as usize
}
