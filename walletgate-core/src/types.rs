//! Core data types for walletgate

use ed25519_dalek::VerifyingKey;
use std::hash::{Hash, Hasher};

/// Length in bytes of a decoded wallet address (Ed25519 verifying key).
pub const ADDRESS_LEN: usize = 32;

/// Base-58 encoded Ed25519 wallet address.
///
/// Construction goes through [`WalletAddress::parse`], so every value of
/// this type decodes to a structurally valid verifying key. Validation is
/// purely structural; it does not prove the caller holds the matching
/// private key.
#[derive(Debug, Clone)]
pub struct WalletAddress {
    encoded: String,
    key: VerifyingKey,
}

impl WalletAddress {
    /// Parse and validate a base-58 address string.
    pub fn parse(input: &str) -> crate::Result<Self> {
        if input.is_empty() {
            return Err(crate::GateError::InvalidInput("address"));
        }

        let bytes = bs58::decode(input)
            .into_vec()
            .map_err(|e| crate::GateError::InvalidAddress(format!("bad base-58: {}", e)))?;

        let bytes: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            crate::GateError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ADDRESS_LEN,
                b.len()
            ))
        })?;

        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| crate::GateError::InvalidAddress(format!("invalid public key: {}", e)))?;

        Ok(WalletAddress {
            encoded: input.to_string(),
            key,
        })
    }

    /// Build an address from a verifying key (the wallet side).
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        WalletAddress {
            encoded: bs58::encode(key.as_bytes()).into_string(),
            key: *key,
        }
    }

    /// Get the base-58 encoding as a string slice.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// Get the verifying key this address decodes to.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.key
    }
}

// Base-58 decoding is injective, so the encoded form identifies the key.
impl PartialEq for WalletAddress {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for WalletAddress {}

impl Hash for WalletAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encoded)
    }
}

/// Outstanding challenge for a single address.
///
/// Owned by the challenge store; destroyed on successful verification, on
/// expiry, or on overwrite by a fresh initiation for the same address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Short code the wallet must sign into the canonical message.
    pub code: String,
    /// Issuance time, unix milliseconds.
    pub issued_at_ms: u64,
    /// Expiry deadline, unix milliseconds.
    pub deadline_ms: u64,
}

impl Challenge {
    /// Create a challenge expiring `ttl_ms` after issuance.
    pub fn new(code: String, issued_at_ms: u64, ttl_ms: u64) -> Self {
        Challenge {
            code,
            issued_at_ms,
            deadline_ms: issued_at_ms.saturating_add(ttl_ms),
        }
    }

    /// Whether the challenge is past its deadline at the given instant.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms > self.deadline_ms
    }
}
