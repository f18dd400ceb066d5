//! 32-bit FNV-1a over the canonical key bytes.
//!
//! Hashes are only a pre-filter for key comparison; they carry no collision
//! resistance guarantees.

/// FNV-1a 32-bit offset basis.
pub const OFFSET_BASIS: u32 = 2_166_136_261;

/// FNV-1a 32-bit prime.
pub const PRIME: u32 = 16_777_619;

/// Hash a byte slice with 32-bit FNV-1a, one byte at a time.
#[inline]
pub const fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash = OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(PRIME);
        i += 1;
    }
    hash
}

/// Hash a canonical key string.
#[inline]
pub const fn hash_key(key: &str) -> u32 {
    fnv1a(key.as_bytes())
}
