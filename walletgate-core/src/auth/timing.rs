//! Constant-time comparisons
//!
//! Comparison utilities for credentials where early-exit equality would
//! leak how much of a guess matched.

use subtle::ConstantTimeEq;

/// Constant-time byte comparison. Length mismatch returns early; lengths
/// are not secret here.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

/// Constant-time string comparison (for bearer tokens).
pub fn constant_time_str_compare(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}
