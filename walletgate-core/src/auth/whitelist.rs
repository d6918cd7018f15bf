//! Admission whitelist

use crate::types::WalletAddress;
use std::collections::HashSet;

/// Process-wide, read-only set of addresses permitted to authenticate.
///
/// Loaded once at startup and immutable thereafter; the core contract is
/// membership testing only.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    addresses: HashSet<WalletAddress>,
}

impl Whitelist {
    /// Build a whitelist from validated addresses.
    pub fn new(addresses: impl IntoIterator<Item = WalletAddress>) -> Self {
        Whitelist {
            addresses: addresses.into_iter().collect(),
        }
    }

    /// Whether the address is permitted to initiate authentication.
    pub fn contains(&self, address: &WalletAddress) -> bool {
        self.addresses.contains(address)
    }

    /// Number of whitelisted addresses.
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Whether the whitelist is empty (nobody can authenticate).
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}
