//! Two-phase authentication flow
//!
//! `initiate` issues a short-lived challenge for a whitelisted address;
//! `verify` checks a detached signature over the canonical message and,
//! on success, consumes the challenge exactly once and mints a session
//! token. All collaborators are injected capabilities so randomness,
//! storage, and time can be swapped in tests and deployments.

use crate::auth::canonical::challenge_message;
use crate::auth::challenge::{CodeGenerator, SecureCodeGenerator};
use crate::auth::clock::{Clock, SystemClock};
use crate::auth::session::{RandomTokenIssuer, SessionToken, TokenIssuer};
use crate::auth::store::{ChallengeStore, InMemoryChallengeStore};
use crate::auth::whitelist::Whitelist;
use crate::error::GateError;
use crate::types::{Challenge, WalletAddress};
use crate::Result;
use ed25519_dalek::{Signature, Verifier};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Default lifetime of an issued challenge.
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(300);

const SIGNING_INSTRUCTIONS: &str =
    "Sign this message with the wallet's private key and submit the base-58 signature";

/// Response to a successful initiation.
#[derive(Debug, Clone, Serialize)]
pub struct ChallengeGrant {
    /// The short challenge code, also embedded in `message`.
    pub code: String,
    /// The exact message the wallet must sign.
    pub message: String,
    /// Human-readable signing instructions.
    pub instructions: String,
}

/// Response to a successful verification.
#[derive(Debug, Clone, Serialize)]
pub struct SessionGrant {
    /// The authenticated address, as presented.
    pub address: String,
    /// Opaque bearer token for the session.
    pub token: SessionToken,
}

/// Orchestrates the two-phase challenge-response protocol.
///
/// The challenge store is the only shared mutable state; every operation
/// here is a short, synchronous, CPU-bound computation, safe to call from
/// concurrent request handlers.
pub struct Authenticator {
    whitelist: Whitelist,
    store: Arc<dyn ChallengeStore>,
    codes: Box<dyn CodeGenerator>,
    tokens: Box<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
    ttl_ms: u64,
}

impl Authenticator {
    /// Production wiring: OS CSPRNG for codes and tokens, wall clock,
    /// in-memory sharded store.
    pub fn new(whitelist: Whitelist, ttl: Duration) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::with_capabilities(
            whitelist,
            Arc::new(InMemoryChallengeStore::new(clock.clone())),
            Box::new(SecureCodeGenerator),
            Box::new(RandomTokenIssuer),
            clock,
            ttl,
        )
    }

    /// Explicit wiring for tests and embedders that swap capabilities.
    pub fn with_capabilities(
        whitelist: Whitelist,
        store: Arc<dyn ChallengeStore>,
        codes: Box<dyn CodeGenerator>,
        tokens: Box<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Authenticator {
            whitelist,
            store,
            codes,
            tokens,
            clock,
            ttl_ms: ttl.as_millis() as u64,
        }
    }

    /// Phase one: issue a challenge for a whitelisted address.
    ///
    /// Unconditionally replaces any outstanding challenge for the same
    /// address, invalidating previously issued messages.
    pub fn initiate(&self, address: &str) -> Result<ChallengeGrant> {
        let address = WalletAddress::parse(address)?;

        if !self.whitelist.contains(&address) {
            return Err(GateError::NotWhitelisted);
        }

        let code = self.codes.generate();
        let issued_at_ms = self.clock.now_ms();
        let challenge = Challenge::new(code.clone(), issued_at_ms, self.ttl_ms);
        let message = challenge_message(&code, issued_at_ms, address.as_str());

        self.store.put(&address, challenge);

        Ok(ChallengeGrant {
            code,
            message,
            instructions: SIGNING_INSTRUCTIONS.to_string(),
        })
    }

    /// Phase two: verify a detached signature over the outstanding
    /// challenge and mint a session token.
    ///
    /// A failed verification leaves the challenge in place; the client
    /// may retry with a corrected signature until the deadline. Expired,
    /// consumed, and never-issued challenges are indistinguishable.
    pub fn verify(&self, address: &str, signature: &str) -> Result<SessionGrant> {
        let address = WalletAddress::parse(address)?;

        let challenge = self.store.get(&address).ok_or(GateError::NoChallenge)?;
        let message = challenge_message(&challenge.code, challenge.issued_at_ms, address.as_str());

        let signature = decode_signature(signature)?;
        address
            .verifying_key()
            .verify(message.as_bytes(), &signature)
            .map_err(|_| GateError::VerificationFailed)?;

        // One-shot consumption is the linearization point of a successful
        // verify: if the challenge was consumed or replaced since the read
        // above, this verify loses and reports no challenge.
        if !self.store.consume(&address, &challenge) {
            return Err(GateError::NoChallenge);
        }

        let token = self.tokens.mint(&address);

        Ok(SessionGrant {
            address: address.as_str().to_string(),
            token,
        })
    }
}

/// Decode a base-58 detached Ed25519 signature (64 bytes).
///
/// Malformed encoding is a verification failure reported to the caller,
/// never a panic or a propagated decode exception.
fn decode_signature(input: &str) -> Result<Signature> {
    if input.is_empty() {
        return Err(GateError::InvalidInput("signature"));
    }

    let bytes = bs58::decode(input)
        .into_vec()
        .map_err(|e| GateError::MalformedSignature(format!("bad base-58: {}", e)))?;

    let bytes: [u8; 64] = bytes.try_into().map_err(|b: Vec<u8>| {
        GateError::MalformedSignature(format!("expected 64 bytes, got {}", b.len()))
    })?;

    Ok(Signature::from_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::auth::keys::KeyPair;

    /// Code generator pinned to a fixed sequence for deterministic tests.
    struct FixedCodes(std::sync::Mutex<Vec<String>>);

    impl FixedCodes {
        fn new(codes: &[&str]) -> Self {
            FixedCodes(std::sync::Mutex::new(
                codes.iter().rev().map(|c| c.to_string()).collect(),
            ))
        }
    }

    impl CodeGenerator for FixedCodes {
        fn generate(&self) -> String {
            self.0.lock().unwrap().pop().expect("fixed codes exhausted")
        }
    }

    struct Fixture {
        authenticator: Authenticator,
        clock: Arc<ManualClock>,
        store: Arc<InMemoryChallengeStore>,
        keypair: KeyPair,
    }

    fn fixture_with_codes(codes: &[&str]) -> Fixture {
        let keypair = KeyPair::generate();
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = Arc::new(InMemoryChallengeStore::new(clock.clone()));
        let authenticator = Authenticator::with_capabilities(
            Whitelist::new([keypair.address()]),
            store.clone(),
            Box::new(FixedCodes::new(codes)),
            Box::new(RandomTokenIssuer),
            clock.clone(),
            DEFAULT_CHALLENGE_TTL,
        );

        Fixture {
            authenticator,
            clock,
            store,
            keypair,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_codes(&["Q7K2M9"])
    }

    #[test]
    fn auth_initiate_then_verify_succeeds_exactly_once() {
        let f = fixture();
        let address = f.keypair.address();

        let grant = f.authenticator.initiate(address.as_str()).unwrap();
        assert_eq!(grant.code, "Q7K2M9");
        assert_eq!(
            grant.message,
            format!(
                "Verify wallet ownership: Q7K2M9\nTimestamp: 1700000000000\nAddress: {}",
                address
            )
        );

        let signature = f.keypair.sign_base58(grant.message.as_bytes());
        let session = f.authenticator.verify(address.as_str(), &signature).unwrap();
        assert_eq!(session.address, address.as_str());
        assert_eq!(session.token.as_str().len(), 64);

        // Replaying the same signature after success finds no challenge
        let replay = f.authenticator.verify(address.as_str(), &signature);
        assert_eq!(replay.unwrap_err(), GateError::NoChallenge);
    }

    #[test]
    fn auth_verify_before_initiate_finds_no_challenge() {
        let f = fixture();
        let address = f.keypair.address();
        let signature = f.keypair.sign_base58(b"anything");

        let result = f.authenticator.verify(address.as_str(), &signature);
        assert_eq!(result.unwrap_err(), GateError::NoChallenge);
    }

    #[test]
    fn auth_wrong_key_fails_and_challenge_survives_for_retry() {
        let f = fixture();
        let address = f.keypair.address();
        let grant = f.authenticator.initiate(address.as_str()).unwrap();

        // Signed by a different wallet
        let intruder = KeyPair::generate();
        let bad_signature = intruder.sign_base58(grant.message.as_bytes());
        let result = f.authenticator.verify(address.as_str(), &bad_signature);
        assert_eq!(result.unwrap_err(), GateError::VerificationFailed);

        // Failure left the challenge live; the correct signature still works
        let good_signature = f.keypair.sign_base58(grant.message.as_bytes());
        assert!(f.authenticator.verify(address.as_str(), &good_signature).is_ok());
    }

    #[test]
    fn auth_tampered_message_fails_verification() {
        let f = fixture();
        let address = f.keypair.address();
        let grant = f.authenticator.initiate(address.as_str()).unwrap();

        let mut tampered = grant.message.into_bytes();
        tampered[0] ^= 0x01;
        let signature = f.keypair.sign_base58(&tampered);

        let result = f.authenticator.verify(address.as_str(), &signature);
        assert_eq!(result.unwrap_err(), GateError::VerificationFailed);
    }

    #[test]
    fn auth_second_initiate_invalidates_first_challenge() {
        let f = fixture_with_codes(&["FIRST1", "SECOND"]);
        let address = f.keypair.address();

        let first = f.authenticator.initiate(address.as_str()).unwrap();
        let second = f.authenticator.initiate(address.as_str()).unwrap();
        assert_ne!(first.code, second.code);

        // A signature over the first message no longer verifies
        let stale = f.keypair.sign_base58(first.message.as_bytes());
        let result = f.authenticator.verify(address.as_str(), &stale);
        assert_eq!(result.unwrap_err(), GateError::VerificationFailed);

        // The second challenge is still live
        let fresh = f.keypair.sign_base58(second.message.as_bytes());
        assert!(f.authenticator.verify(address.as_str(), &fresh).is_ok());
    }

    #[test]
    fn auth_expired_challenge_reports_no_challenge_not_bad_signature() {
        let f = fixture();
        let address = f.keypair.address();

        let grant = f.authenticator.initiate(address.as_str()).unwrap();
        let signature = f.keypair.sign_base58(grant.message.as_bytes());

        f.clock.advance(DEFAULT_CHALLENGE_TTL.as_millis() as u64 + 1);

        let result = f.authenticator.verify(address.as_str(), &signature);
        assert_eq!(result.unwrap_err(), GateError::NoChallenge);
    }

    #[test]
    fn auth_verify_at_deadline_still_succeeds() {
        let f = fixture();
        let address = f.keypair.address();

        let grant = f.authenticator.initiate(address.as_str()).unwrap();
        let signature = f.keypair.sign_base58(grant.message.as_bytes());

        f.clock.advance(DEFAULT_CHALLENGE_TTL.as_millis() as u64);

        assert!(f.authenticator.verify(address.as_str(), &signature).is_ok());
    }

    #[test]
    fn auth_non_whitelisted_address_is_rejected_without_state() {
        let f = fixture();
        let outsider = KeyPair::generate();
        let address = outsider.address();

        let result = f.authenticator.initiate(address.as_str());
        assert_eq!(result.unwrap_err(), GateError::NotWhitelisted);

        // No challenge was stored for the rejected address
        assert!(f.store.get(&address).is_none());
    }

    #[test]
    fn auth_invalid_address_is_rejected_on_both_phases() {
        let f = fixture();

        assert!(matches!(
            f.authenticator.initiate("not-an-address!").unwrap_err(),
            GateError::InvalidAddress(_)
        ));
        assert!(matches!(
            f.authenticator.verify("not-an-address!", "sig").unwrap_err(),
            GateError::InvalidAddress(_)
        ));
        assert_eq!(
            f.authenticator.initiate("").unwrap_err(),
            GateError::InvalidInput("address")
        );
    }

    #[test]
    fn auth_malformed_signature_is_not_a_crash() {
        let f = fixture();
        let address = f.keypair.address();
        f.authenticator.initiate(address.as_str()).unwrap();

        // Bad charset
        let result = f.authenticator.verify(address.as_str(), "0OIl+/==");
        assert!(matches!(
            result.unwrap_err(),
            GateError::MalformedSignature(_)
        ));

        // Valid base-58, wrong length
        let short = bs58::encode([1u8; 16]).into_string();
        let result = f.authenticator.verify(address.as_str(), &short);
        assert!(matches!(
            result.unwrap_err(),
            GateError::MalformedSignature(_)
        ));

        // Empty
        let result = f.authenticator.verify(address.as_str(), "");
        assert_eq!(result.unwrap_err(), GateError::InvalidInput("signature"));
    }

    #[test]
    fn auth_codes_collide_across_addresses_without_interference() {
        let keypair_a = KeyPair::generate();
        let keypair_b = KeyPair::generate();
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = Arc::new(InMemoryChallengeStore::new(clock.clone()));
        let authenticator = Authenticator::with_capabilities(
            Whitelist::new([keypair_a.address(), keypair_b.address()]),
            store,
            Box::new(FixedCodes::new(&["SAME01", "SAME01"])),
            Box::new(RandomTokenIssuer),
            clock,
            DEFAULT_CHALLENGE_TTL,
        );

        let grant_a = authenticator.initiate(keypair_a.address().as_str()).unwrap();
        let grant_b = authenticator.initiate(keypair_b.address().as_str()).unwrap();
        assert_eq!(grant_a.code, grant_b.code);

        // Codes are scoped per address; each wallet signs its own message
        let sig_a = keypair_a.sign_base58(grant_a.message.as_bytes());
        let sig_b = keypair_b.sign_base58(grant_b.message.as_bytes());
        assert!(authenticator.verify(keypair_a.address().as_str(), &sig_a).is_ok());
        assert!(authenticator.verify(keypair_b.address().as_str(), &sig_b).is_ok());
    }
}
