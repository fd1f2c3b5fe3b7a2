//! Binary envelopes for image blobs.
//!
//! Same construction as text envelopes, but salt and IV are stored as their
//! own hex columns instead of being framed into the blob:
//!
//! | column       | content                                   |
//! |--------------|-------------------------------------------|
//! | `ciphertext` | raw bytes, ciphertext with GCM tag        |
//! | `salt_hex`   | 32 lowercase hex chars                    |
//! | `iv_hex`     | 24 lowercase hex chars                    |
//! | `version`    | `"legacy"` or `"v1"` (absent = legacy)    |
//! | `iterations` | PBKDF2 count (absent = 65536)             |

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::crypto::IV_LEN;
use crate::envelope;
use crate::error::EnvelopeError;
use crate::format::FormatVersion;
use crate::keys::{LEGACY_ITERATIONS, SALT_LEN};

fn legacy_iterations() -> u32 {
    LEGACY_ITERATIONS
}

/// An encrypted binary payload split into its persisted fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryEnvelope {
    /// Ciphertext with the 16-byte tag appended.
    pub ciphertext: Vec<u8>,
    /// PBKDF2 salt, lowercase hex.
    pub salt_hex: String,
    /// GCM IV, lowercase hex.
    pub iv_hex: String,
    /// Layout version. Rows written before versioning deserialize as legacy.
    #[serde(default)]
    pub version: FormatVersion,
    /// PBKDF2 iteration count.
    #[serde(default = "legacy_iterations")]
    pub iterations: u32,
}

impl BinaryEnvelope {
    /// Decrypt this envelope, honouring its recorded version.
    pub fn open(&self, passphrase: &str) -> Result<Vec<u8>, EnvelopeError> {
        self.version.check_iterations(self.iterations)?;
        open_fields(
            &self.ciphertext,
            &self.salt_hex,
            &self.iv_hex,
            passphrase,
            self.iterations,
        )
    }

    /// Length of the plaintext this envelope decrypts to.
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(crate::crypto::TAG_LEN)
    }
}

/// Seal `data` into a split-field envelope.
pub(crate) fn seal_binary(
    data: &[u8],
    passphrase: &str,
    format: FormatVersion,
    iterations: u32,
) -> Result<BinaryEnvelope, EnvelopeError> {
    format.check_iterations(iterations)?;
    let sealed = envelope::seal_parts(data, passphrase, iterations)?;
    debug!(?format, data_len = data.len(), "sealed binary envelope");

    Ok(BinaryEnvelope {
        ciphertext: sealed.ciphertext,
        salt_hex: hex::encode(sealed.salt),
        iv_hex: hex::encode(sealed.iv),
        version: format,
        iterations,
    })
}

/// Decrypt the three persisted fields of a split-field envelope.
pub(crate) fn open_fields(
    ciphertext: &[u8],
    salt_hex: &str,
    iv_hex: &str,
    passphrase: &str,
    iterations: u32,
) -> Result<Vec<u8>, EnvelopeError> {
    let salt: [u8; SALT_LEN] = decode_hex_field("salt", salt_hex)?;
    let iv: [u8; IV_LEN] = decode_hex_field("iv", iv_hex)?;

    let data = envelope::open_parts(&salt, &iv, ciphertext, passphrase, iterations).inspect_err(
        |e| {
            if *e == EnvelopeError::DecryptionFailed {
                warn!("binary envelope failed authentication");
            }
        },
    )?;
    debug!(data_len = data.len(), "opened binary envelope");
    Ok(data)
}

fn decode_hex_field<const N: usize>(field: &str, value: &str) -> Result<[u8; N], EnvelopeError> {
    let mut out = [0u8; N];
    hex::decode_to_slice(value, &mut out).map_err(|e| {
        warn!(field, error = %e, "binary envelope has an invalid hex field");
        EnvelopeError::MalformedEnvelope(format!(
            "{field} must be {} hex chars: {e}",
            N * 2
        ))
    })?;
    Ok(out)
}
