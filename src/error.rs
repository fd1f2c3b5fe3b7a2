//! Error types for notevault.
//!
//! Every variant is a distinct failure mode. Messages say *what* failed
//! without revealing *why* in ways that could leak cryptographic state: a
//! wrong passphrase and a tampered ciphertext are the same `DecryptionFailed`.

use thiserror::Error;

/// The single error type for all notevault operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The token or envelope fields are not well-formed: bad base64 or hex,
    /// truncated framing, or an authenticated payload that is not UTF-8.
    /// Not retryable; the record should be treated as unreadable.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// GCM tag verification failed. Covers a wrong passphrase, tampered
    /// ciphertext, and a corrupted tag alike.
    #[error("decryption failed")]
    DecryptionFailed,

    /// PBKDF2 could not produce a key (for example a zero iteration count).
    #[error("key derivation failed")]
    KeyDerivation,

    /// The AEAD primitive rejected the key material.
    #[error("cipher unavailable")]
    CipherUnavailable,

    /// The system random source failed to produce bytes.
    #[error("randomness source failed")]
    RandomnessFailure,

    /// Sealing failed inside the AEAD primitive.
    #[error("encryption failed")]
    EncryptionFailed,

    /// The envelope carries a format version this build does not understand.
    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u8),

    /// Writer configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A stored login credential could not be parsed.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// No record exists under the given key.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// A record already exists under the given key.
    #[error("record already exists: {0}")]
    RecordExists(String),

    /// JSON (de)serialization of configuration or records failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A rotation write failed and these records could not be restored to
    /// their previous envelopes. They open only under the new passphrase.
    #[error("rotation incomplete: {} record(s) left under the new passphrase", .0.len())]
    RotationIncomplete(Vec<String>),

    /// The startup self-test observed a primitive misbehaving.
    #[error("self-test failed: {0}")]
    SelfTestFailed(&'static str),
}

impl EnvelopeError {
    /// True for failures that mean the stored data cannot be read with the
    /// given passphrase, as opposed to a fault in the host environment.
    pub fn is_unreadable_record(&self) -> bool {
        matches!(
            self,
            Self::MalformedEnvelope(_) | Self::DecryptionFailed | Self::UnsupportedVersion(_)
        )
    }
}

impl From<serde_json::Error> for EnvelopeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;
