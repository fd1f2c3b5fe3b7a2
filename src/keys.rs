//! Key derivation and ownership.
//!
//! This module owns two responsibilities:
//! 1. Deriving a per-envelope key from a passphrase and a salt with
//!    PBKDF2-HMAC-SHA256.
//! 2. Holding derived key material in a type that is opaque, non-cloneable
//!    and zeroised on drop.
//!
//! ## Derivation structure
//!
//! ```text
//! PBKDF2-HMAC-SHA256(
//!     password   = passphrase (UTF-8),
//!     salt       = 16 random bytes stored with the envelope,
//!     iterations = 65536 (unversioned envelopes) or the stored count (v1),
//!     dkLen      = 32
//! )
//! ```
//!
//! Keys are not cached. Every seal and every open re-derives from scratch,
//! so the cost of one PBKDF2 run is paid per field.

use std::num::NonZeroU32;

use ring::pbkdf2;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::KEY_LEN;
use crate::error::EnvelopeError;

/// Size of the PBKDF2 salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Iteration count fixed by the unversioned envelope formats.
pub const LEGACY_ITERATIONS: u32 = 65_536;

// ---------------------------------------------------------------------------
// Derived key
// ---------------------------------------------------------------------------

/// A 256-bit key derived for exactly one envelope.
///
/// - Not `Clone`. Each key is scoped to a single seal or open.
/// - Zeroised on drop.
/// - Raw bytes never leave the crate.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Borrow the raw key bytes for the AEAD primitive.
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive the envelope key for `passphrase` and `salt`.
///
/// Deterministic: the same inputs always yield the same key, which is what
/// lets an open re-derive the key from the stored salt. A zero iteration
/// count is rejected with `KeyDerivation`.
pub fn derive_key(
    passphrase: &str,
    salt: &[u8; SALT_LEN],
    iterations: u32,
) -> Result<DerivedKey, EnvelopeError> {
    let iterations = NonZeroU32::new(iterations).ok_or(EnvelopeError::KeyDerivation)?;

    let mut bytes = [0u8; KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        passphrase.as_bytes(),
        &mut bytes,
    );

    Ok(DerivedKey { bytes })
}

/// Derive raw PBKDF2 output of arbitrary length.
///
/// Used for login credential hashes, where the output is stored rather than
/// used as a cipher key.
pub(crate) fn derive_raw(secret: &[u8], salt: &[u8], iterations: NonZeroU32, out: &mut [u8]) {
    pbkdf2::derive(pbkdf2::PBKDF2_HMAC_SHA256, iterations, salt, secret, out);
}

/// Constant-time check that `secret` derives to `expected`.
pub(crate) fn verify_raw(
    secret: &[u8],
    salt: &[u8],
    iterations: NonZeroU32,
    expected: &[u8],
) -> bool {
    pbkdf2::verify(pbkdf2::PBKDF2_HMAC_SHA256, iterations, salt, secret, expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive_vector(password: &[u8], salt: &[u8], iterations: u32) -> String {
        let mut out = [0u8; 32];
        derive_raw(password, salt, NonZeroU32::new(iterations).unwrap(), &mut out);
        hex::encode(out)
    }

    #[test]
    fn pbkdf2_sha256_known_answers() {
        assert_eq!(
            derive_vector(b"password", b"salt", 1),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
        assert_eq!(
            derive_vector(b"password", b"salt", 2),
            "ae4d0c95af6b46d32d0adff928f06dd02a303f8ef3c251dfd6e2d85a95474c43"
        );
        assert_eq!(
            derive_vector(b"password", b"salt", 4096),
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
        );
    }

    #[test]
    fn same_inputs_same_key() {
        let salt = [3u8; SALT_LEN];
        let a = derive_key("alice:hash", &salt, 1_000).unwrap();
        let b = derive_key("alice:hash", &salt, 1_000).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_salt_different_key() {
        let a = derive_key("alice:hash", &[1u8; SALT_LEN], 1_000).unwrap();
        let b = derive_key("alice:hash", &[2u8; SALT_LEN], 1_000).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_passphrase_different_key() {
        let salt = [9u8; SALT_LEN];
        let a = derive_key("alice:hash", &salt, 1_000).unwrap();
        let b = derive_key("bob:hash", &salt, 1_000).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn zero_iterations_rejected() {
        assert_eq!(
            derive_key("p", &[0u8; SALT_LEN], 0).unwrap_err(),
            EnvelopeError::KeyDerivation
        );
    }

    #[test]
    fn debug_is_redacted() {
        let key = DerivedKey::from_bytes([0xAB; KEY_LEN]);
        assert!(!format!("{key:?}").contains("ab"));
    }

    #[test]
    fn verify_raw_matches_derive_raw() {
        let iterations = NonZeroU32::new(10).unwrap();
        let mut out = [0u8; 32];
        derive_raw(b"secret", b"pepper-salt", iterations, &mut out);
        assert!(verify_raw(b"secret", b"pepper-salt", iterations, &out));
        assert!(!verify_raw(b"Secret", b"pepper-salt", iterations, &out));
    }
}
