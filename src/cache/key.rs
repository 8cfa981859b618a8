//! Cache key hashing and normalization
//!
//! Keys are logical request fingerprints (endpoint plus normalized
//! parameters). `hash_key` turns one into a fixed-length, filesystem-safe
//! file name; it is not a security boundary.

use std::fmt::Write as _;

use sha2::{Digest, Sha256};

/// Returns the lowercase-hex SHA-256 digest of `key`.
pub fn hash_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());

    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        // Writing to a String cannot fail
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Normalizes a parameter value for use inside a cache key.
///
/// ASCII-lowercases the input and collapses every run of spaces, tabs, `+`,
/// or `_` into a single `_`, with no leading or trailing separator, so that
/// "New York", "new+york", and "NEW  YORK" fingerprint identically.
pub fn normalize_for_key(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_was_sep = false;

    for c in input.chars() {
        if matches!(c, ' ' | '\t' | '+' | '_') {
            if out.is_empty() || prev_was_sep {
                continue;
            }
            out.push('_');
            prev_was_sep = true;
        } else {
            out.push(c.to_ascii_lowercase());
            prev_was_sep = false;
        }
    }

    if out.ends_with('_') {
        out.pop();
    }
    out
}
