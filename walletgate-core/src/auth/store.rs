//! Keyed temporary storage for outstanding challenges

use crate::auth::clock::Clock;
use crate::types::{Challenge, WalletAddress};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

/// Number of independent map partitions. Operations on the same address
/// serialize on one shard lock; different addresses land on different
/// shards and proceed without contention.
const SHARD_COUNT: usize = 16;

/// Temporary challenge state, keyed by address.
///
/// `put`, `get`, and `consume` are linearizable per address. The store is
/// process-local: created empty at startup, cleared on restart, no
/// on-disk format.
pub trait ChallengeStore: Send + Sync {
    /// Store a challenge, replacing any outstanding one for the address.
    fn put(&self, address: &WalletAddress, challenge: Challenge);

    /// Fetch the live challenge for an address. Entries past their
    /// deadline are removed and reported absent.
    fn get(&self, address: &WalletAddress) -> Option<Challenge>;

    /// Remove the entry if it still equals `expected`, returning whether
    /// it was removed. The match guard keeps a verify that raced a fresh
    /// initiation from consuming the replacement challenge, and keeps two
    /// concurrent verifies from both succeeding.
    fn consume(&self, address: &WalletAddress, expected: &Challenge) -> bool;
}

/// In-memory sharded challenge store.
pub struct InMemoryChallengeStore {
    shards: Vec<Mutex<HashMap<WalletAddress, Challenge>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryChallengeStore {
    /// Create an empty store reading expiry time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let shards = (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect();
        InMemoryChallengeStore { shards, clock }
    }

    fn shard(&self, address: &WalletAddress) -> &Mutex<HashMap<WalletAddress, Challenge>> {
        let mut hasher = DefaultHasher::new();
        address.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }
}

impl ChallengeStore for InMemoryChallengeStore {
    fn put(&self, address: &WalletAddress, challenge: Challenge) {
        let mut shard = self.shard(address).lock().unwrap();
        shard.insert(address.clone(), challenge);
    }

    fn get(&self, address: &WalletAddress) -> Option<Challenge> {
        let now_ms = self.clock.now_ms();
        let mut shard = self.shard(address).lock().unwrap();

        match shard.get(address) {
            Some(challenge) if challenge.is_expired_at(now_ms) => {
                shard.remove(address);
                None
            }
            Some(challenge) => Some(challenge.clone()),
            None => None,
        }
    }

    fn consume(&self, address: &WalletAddress, expected: &Challenge) -> bool {
        let mut shard = self.shard(address).lock().unwrap();

        match shard.get(address) {
            Some(challenge) if challenge == expected => {
                shard.remove(address);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::auth::keys::KeyPair;

    fn store_at(now_ms: u64) -> (InMemoryChallengeStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now_ms));
        (InMemoryChallengeStore::new(clock.clone()), clock)
    }

    fn challenge(code: &str, issued_at_ms: u64) -> Challenge {
        Challenge::new(code.to_string(), issued_at_ms, 300_000)
    }

    #[test]
    fn test_put_get_roundtrip() {
        let (store, _clock) = store_at(1_000);
        let address = KeyPair::generate().address();
        let c = challenge("ABC123", 1_000);

        store.put(&address, c.clone());
        assert_eq!(store.get(&address), Some(c));
    }

    #[test]
    fn test_get_missing_address() {
        let (store, _clock) = store_at(1_000);
        let address = KeyPair::generate().address();
        assert_eq!(store.get(&address), None);
    }

    #[test]
    fn test_put_overwrites_existing() {
        let (store, _clock) = store_at(1_000);
        let address = KeyPair::generate().address();

        store.put(&address, challenge("FIRST1", 1_000));
        store.put(&address, challenge("SECOND", 2_000));

        assert_eq!(store.get(&address).unwrap().code, "SECOND");
    }

    #[test]
    fn test_get_removes_expired_entry() {
        let (store, clock) = store_at(1_000);
        let address = KeyPair::generate().address();

        store.put(&address, challenge("ABC123", 1_000));
        clock.set(1_000 + 300_001);

        assert_eq!(store.get(&address), None);

        // Entry is gone even if the clock rolls back
        clock.set(1_000);
        assert_eq!(store.get(&address), None);
    }

    #[test]
    fn test_consume_matching_entry() {
        let (store, _clock) = store_at(1_000);
        let address = KeyPair::generate().address();
        let c = challenge("ABC123", 1_000);

        store.put(&address, c.clone());
        assert!(store.consume(&address, &c));
        assert_eq!(store.get(&address), None);

        // Second consume finds nothing
        assert!(!store.consume(&address, &c));
    }

    #[test]
    fn test_consume_rejects_replaced_entry() {
        let (store, _clock) = store_at(1_000);
        let address = KeyPair::generate().address();
        let first = challenge("FIRST1", 1_000);

        store.put(&address, first.clone());
        store.put(&address, challenge("SECOND", 2_000));

        // The first challenge was overwritten; consuming it must not
        // remove the replacement
        assert!(!store.consume(&address, &first));
        assert_eq!(store.get(&address).unwrap().code, "SECOND");
    }

    #[test]
    fn test_addresses_are_independent() {
        let (store, _clock) = store_at(1_000);
        let a = KeyPair::generate().address();
        let b = KeyPair::generate().address();

        store.put(&a, challenge("AAAAAA", 1_000));
        store.put(&b, challenge("BBBBBB", 1_000));

        let ca = store.get(&a).unwrap();
        assert!(store.consume(&a, &ca));
        assert_eq!(store.get(&b).unwrap().code, "BBBBBB");
    }

    #[test]
    fn test_concurrent_consume_single_winner() {
        let (store, _clock) = store_at(1_000);
        let store = Arc::new(store);
        let address = KeyPair::generate().address();
        let c = challenge("ABC123", 1_000);
        store.put(&address, c.clone());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let address = address.clone();
            let c = c.clone();
            handles.push(std::thread::spawn(move || store.consume(&address, &c)));
        }

        let wins: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(wins, 1);
    }
}
