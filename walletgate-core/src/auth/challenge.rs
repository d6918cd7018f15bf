//! Challenge code generation

use rand::rngs::OsRng;
use rand::Rng;

/// Alphabet for challenge codes: uppercase letters and digits, 36 symbols.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a challenge code.
pub const CODE_LEN: usize = 6;

/// Source of challenge codes, injected into the authenticator so it can
/// be swapped or pinned in tests.
pub trait CodeGenerator: Send + Sync {
    /// Produce a fresh code. Collisions across addresses are tolerated;
    /// codes are scoped per address, not globally unique.
    fn generate(&self) -> String;
}

/// Production generator backed by the operating system CSPRNG.
///
/// Codes must be unpredictable to an adversary without process access,
/// so a non-cryptographic source is not acceptable here.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecureCodeGenerator;

impl CodeGenerator for SecureCodeGenerator {
    fn generate(&self) -> String {
        let mut rng = OsRng;
        (0..CODE_LEN)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }
}
