//! Canonical challenge message construction
//!
//! The wallet signs exactly the bytes produced here, and verification
//! re-renders them from the stored challenge. Any divergence in layout,
//! whitespace, or number formatting between the two sides is a hard
//! verification failure, so this format is a wire contract.

/// Render the message a wallet must sign for a challenge.
///
/// Three lines joined by `\n`, no trailing newline. The timestamp is
/// base-10 unix milliseconds with no separators, independent of locale
/// and timezone.
pub fn challenge_message(code: &str, issued_at_ms: u64, address: &str) -> String {
    format!(
        "Verify wallet ownership: {}\nTimestamp: {}\nAddress: {}",
        code, issued_at_ms, address
    )
}
