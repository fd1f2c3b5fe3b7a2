//! Low-level cryptographic operations.
//!
//! This module is one of exactly two places in the crate that import `ring`
//! directly for envelope work (the other is `keys`). Everything that frames
//! envelopes goes through the functions exposed here.
//!
//! Primitive choices:
//! - **Cipher**: AES-256-GCM, no associated data
//! - **IV**: 96-bit (12 bytes), generated fresh per seal via `SystemRandom`
//! - **Tag**: 128-bit, appended to the ciphertext

use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::EnvelopeError;
use crate::keys::DerivedKey;

/// The AEAD algorithm used for every envelope.
const ALGORITHM: &aead::Algorithm = &AES_256_GCM;

/// Size of the IV in bytes (96 bits).
pub const IV_LEN: usize = 12;

/// Size of a derived key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Size of the GCM authentication tag in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// Fill `buf` from the system CSPRNG.
///
/// `SystemRandom` is the only source of randomness in the crate and is safe
/// to use from many threads at once.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<(), EnvelopeError> {
    SystemRandom::new()
        .fill(buf)
        .map_err(|_| EnvelopeError::RandomnessFailure)
}

/// Generate `N` random bytes.
pub(crate) fn random_array<const N: usize>() -> Result<[u8; N], EnvelopeError> {
    let mut buf = [0u8; N];
    fill_random(&mut buf)?;
    Ok(buf)
}

fn aead_key(key: &DerivedKey) -> Result<LessSafeKey, EnvelopeError> {
    let unbound =
        UnboundKey::new(ALGORITHM, key.as_bytes()).map_err(|_| EnvelopeError::CipherUnavailable)?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` under `key` and `iv`.
///
/// Returns `ciphertext ‖ tag`. The IV is supplied by the caller because the
/// envelope formats store it in different places; callers must never pass
/// the same IV twice.
pub(crate) fn seal(
    key: &DerivedKey,
    iv: &[u8; IV_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    let key = aead_key(key)?;
    let nonce = Nonce::assume_unique_for_key(*iv);

    let mut in_out = Vec::with_capacity(plaintext.len() + ALGORITHM.tag_len());
    in_out.extend_from_slice(plaintext);

    key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| EnvelopeError::EncryptionFailed)?;

    Ok(in_out)
}

/// Decrypt `ciphertext ‖ tag` under `key` and `iv`.
///
/// A wrong key, a tampered ciphertext and a truncated tag all fail the GCM
/// check the same way. The caller receives no partial plaintext.
pub(crate) fn open(
    key: &DerivedKey,
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    if ciphertext.len() < ALGORITHM.tag_len() {
        return Err(EnvelopeError::DecryptionFailed);
    }

    let key = aead_key(key)?;
    let nonce = Nonce::assume_unique_for_key(*iv);

    let mut in_out = ciphertext.to_vec();
    let plaintext = key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| EnvelopeError::DecryptionFailed)?;

    Ok(plaintext.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::DerivedKey;

    #[test]
    fn tag_len_matches_algorithm() {
        assert_eq!(ALGORITHM.tag_len(), TAG_LEN);
        assert_eq!(ALGORITHM.nonce_len(), IV_LEN);
        assert_eq!(ALGORITHM.key_len(), KEY_LEN);
    }

    #[test]
    fn seal_open_roundtrip() {
        let key = DerivedKey::from_bytes([7u8; KEY_LEN]);
        let iv = [1u8; IV_LEN];
        let sealed = seal(&key, &iv, b"secret message").unwrap();
        assert_eq!(sealed.len(), b"secret message".len() + TAG_LEN);
        assert_eq!(open(&key, &iv, &sealed).unwrap(), b"secret message");
    }

    #[test]
    fn open_with_wrong_iv_fails() {
        let key = DerivedKey::from_bytes([7u8; KEY_LEN]);
        let sealed = seal(&key, &[1u8; IV_LEN], b"payload").unwrap();
        assert_eq!(
            open(&key, &[2u8; IV_LEN], &sealed),
            Err(EnvelopeError::DecryptionFailed)
        );
    }

    #[test]
    fn open_rejects_input_shorter_than_tag() {
        let key = DerivedKey::from_bytes([7u8; KEY_LEN]);
        assert_eq!(
            open(&key, &[0u8; IV_LEN], &[0u8; TAG_LEN - 1]),
            Err(EnvelopeError::DecryptionFailed)
        );
    }

    #[test]
    fn random_arrays_differ() {
        let a: [u8; 16] = random_array().unwrap();
        let b: [u8; 16] = random_array().unwrap();
        assert_ne!(a, b);
    }
}
