//! The configured entry point for sealing and opening fields.

use crate::binary::{self, BinaryEnvelope};
use crate::config::EnvelopeConfig;
use crate::envelope;
use crate::error::EnvelopeError;
use crate::keys::LEGACY_ITERATIONS;

/// Seals text and binary fields according to an `EnvelopeConfig`.
///
/// Holds no secrets and no mutable state. Cheap to copy and safe to share
/// across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sealer {
    config: EnvelopeConfig,
}

impl Sealer {
    /// Build a sealer after validating `config`.
    pub fn new(config: EnvelopeConfig) -> Result<Self, EnvelopeError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration new envelopes are written with.
    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    /// Encrypt a string field into a text token.
    pub fn seal_text(&self, plaintext: &str, passphrase: &str) -> Result<String, EnvelopeError> {
        envelope::seal_text(
            plaintext,
            passphrase,
            self.config.format,
            self.config.iterations,
        )
    }

    /// Decrypt a text token in any known format.
    pub fn open_text(&self, token: &str, passphrase: &str) -> Result<String, EnvelopeError> {
        envelope::open_text(token, passphrase)
    }

    /// Encrypt a binary payload into a split-field envelope.
    pub fn seal_binary(
        &self,
        data: &[u8],
        passphrase: &str,
    ) -> Result<BinaryEnvelope, EnvelopeError> {
        binary::seal_binary(data, passphrase, self.config.format, self.config.iterations)
    }

    /// Decrypt a split-field envelope, honouring its recorded version.
    pub fn open_binary(
        &self,
        envelope: &BinaryEnvelope,
        passphrase: &str,
    ) -> Result<Vec<u8>, EnvelopeError> {
        envelope.open(passphrase)
    }

    /// Decrypt the three unversioned binary columns.
    pub fn open_binary_fields(
        &self,
        ciphertext: &[u8],
        salt_hex: &str,
        iv_hex: &str,
        passphrase: &str,
    ) -> Result<Vec<u8>, EnvelopeError> {
        binary::open_fields(ciphertext, salt_hex, iv_hex, passphrase, LEGACY_ITERATIONS)
    }
}
