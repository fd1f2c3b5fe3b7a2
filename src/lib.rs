//! # notevault
//!
//! Per-record envelope encryption for a note-taking and image-vault
//! application.
//!
//! Every encrypted field is an independent envelope: a fresh 16-byte salt
//! feeds PBKDF2-HMAC-SHA256 (65536 iterations) to derive a 256-bit key, and a
//! fresh 12-byte IV drives AES-256-GCM with a 128-bit tag. Nothing is cached
//! and nothing is shared between calls, so any number of threads may seal and
//! open concurrently.
//!
//! Two envelope shapes are produced:
//! - **Text** (note title/content): one base64 token, see [`encrypt`].
//! - **Binary** (image bytes): ciphertext plus hex salt and IV columns, see
//!   [`encrypt_binary`].
//!
//! ## Public API
//!
//! The free functions below use the default, unversioned format. Callers
//! who want versioned envelopes build a [`Sealer`] from an
//! [`EnvelopeConfig`]. Decryption accepts every known format either way.

pub mod binary;
pub mod config;
pub(crate) mod crypto;
pub mod credentials;
pub(crate) mod envelope;
pub mod error;
pub mod format;
pub mod keys;
pub mod passphrase;
pub mod sealer;
pub mod store;
pub mod vault;

pub use binary::BinaryEnvelope;
pub use config::EnvelopeConfig;
pub use crypto::{IV_LEN, KEY_LEN, TAG_LEN};
pub use envelope::MIN_LEGACY_LEN;
pub use error::{EnvelopeError, EnvelopeResult};
pub use format::FormatVersion;
pub use keys::{LEGACY_ITERATIONS, SALT_LEN};
pub use passphrase::{Passphrase, PassphraseProvider, Principal};
pub use sealer::Sealer;
pub use vault::{ImageVault, Note, NoteVault};

/// Encrypt a string field into a text envelope token.
///
/// The token is `base64(salt ‖ iv ‖ ciphertext ‖ tag)`. Two calls with the
/// same inputs return different tokens.
pub fn encrypt(plaintext: &str, passphrase: &str) -> EnvelopeResult<String> {
    Sealer::default().seal_text(plaintext, passphrase)
}

/// Decrypt a text envelope token.
///
/// Returns `MalformedEnvelope` for tokens that are not base64 or decode to
/// fewer than 28 bytes, and `DecryptionFailed` for a wrong passphrase or any
/// tampering.
pub fn decrypt(token: &str, passphrase: &str) -> EnvelopeResult<String> {
    Sealer::default().open_text(token, passphrase)
}

/// Encrypt a binary payload into a split-field envelope.
pub fn encrypt_binary(data: &[u8], passphrase: &str) -> EnvelopeResult<BinaryEnvelope> {
    Sealer::default().seal_binary(data, passphrase)
}

/// Decrypt the `ciphertext`, `salt_hex` and `iv_hex` columns of a binary
/// envelope.
pub fn decrypt_binary(
    ciphertext: &[u8],
    salt_hex: &str,
    iv_hex: &str,
    passphrase: &str,
) -> EnvelopeResult<Vec<u8>> {
    Sealer::default().open_binary_fields(ciphertext, salt_hex, iv_hex, passphrase)
}

/// Startup check that the primitives behave.
///
/// Round-trips a text and a binary envelope, then confirms that a wrong
/// passphrase and a flipped ciphertext bit are both rejected.
pub fn self_test() -> EnvelopeResult<()> {
    const SAMPLE: &str = "notevault self-test";
    const PASSPHRASE: &str = "self-test:passphrase";

    let token = encrypt(SAMPLE, PASSPHRASE)?;
    if decrypt(&token, PASSPHRASE)? != SAMPLE {
        return Err(EnvelopeError::SelfTestFailed("text round trip altered the plaintext"));
    }
    expect_rejected(
        decrypt(&token, "self-test:wrong"),
        "wrong passphrase accepted",
    )?;

    let sealed = encrypt_binary(SAMPLE.as_bytes(), PASSPHRASE)?;
    if sealed.open(PASSPHRASE)? != SAMPLE.as_bytes() {
        return Err(EnvelopeError::SelfTestFailed("binary round trip altered the payload"));
    }
    let mut tampered = sealed.clone();
    tampered.ciphertext[0] ^= 0x01;
    expect_rejected(tampered.open(PASSPHRASE), "tampered envelope accepted")?;

    tracing::debug!("envelope self-test passed");
    Ok(())
}

fn expect_rejected<T>(result: EnvelopeResult<T>, accepted: &'static str) -> EnvelopeResult<()> {
    match result {
        Err(EnvelopeError::DecryptionFailed) => Ok(()),
        Err(other) => Err(other),
        Ok(_) => Err(EnvelopeError::SelfTestFailed(accepted)),
    }
}
