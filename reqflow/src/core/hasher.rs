//! Dedup key hashing.

use crate::transport::Method;

/// Key grouping calls for single-flight cancellation.
pub type DedupKey = i32;

/// Hashes a string into a signed 32-bit integer.
///
/// `hash = hash * 31 + unit` over UTF-16 code units with 32-bit wraparound.
/// Not cryptographic; distinct inputs can collide.
#[must_use]
pub fn key_hash(input: &str) -> i32 {
    input
        .encode_utf16()
        .fold(0_i32, |hash, unit| {
            hash.wrapping_mul(31).wrapping_add(i32::from(unit))
        })
}

/// Computes the dedup key for a method, URL and caller identifier.
#[must_use]
pub fn dedup_key(method: Method, url: &str, identifier: &str) -> DedupKey {
    key_hash(&format!("{}{url}{identifier}", method.as_str()))
}
