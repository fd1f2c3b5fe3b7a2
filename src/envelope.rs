//! Text envelopes for string fields (note title and content).
//!
//! # Layout
//! ```text
//! legacy: base64( salt (16) | iv (12) | ciphertext + tag )
//! v1:     "v1:" + base64( 0x01 | iterations (u32 BE) | salt (16) | iv (12) | ciphertext + tag )
//! ```
//!
//! Base64 uses the standard alphabet with padding. Both layouts are accepted
//! by `open_text` whatever format the writer is configured for.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};

use crate::crypto::{self, IV_LEN};
use crate::error::EnvelopeError;
use crate::format::{self, FormatVersion, TAG_SEPARATOR};
use crate::keys::{self, LEGACY_ITERATIONS, SALT_LEN};

/// Smallest decoded legacy token: salt plus IV.
pub const MIN_LEGACY_LEN: usize = SALT_LEN + IV_LEN;

/// Version byte plus iteration count in front of a v1 body.
const V1_HEADER_LEN: usize = 1 + 4;

/// The pieces every envelope is made of, however they are framed.
pub(crate) struct Sealed {
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
}

/// Generate a fresh salt and IV, derive the key and seal `plaintext`.
pub(crate) fn seal_parts(
    plaintext: &[u8],
    passphrase: &str,
    iterations: u32,
) -> Result<Sealed, EnvelopeError> {
    let salt: [u8; SALT_LEN] = crypto::random_array()?;
    let iv: [u8; IV_LEN] = crypto::random_array()?;

    let key = keys::derive_key(passphrase, &salt, iterations)?;
    let ciphertext = crypto::seal(&key, &iv, plaintext)?;

    Ok(Sealed {
        salt,
        iv,
        ciphertext,
    })
}

/// Re-derive the key from the stored salt and open the ciphertext.
pub(crate) fn open_parts(
    salt: &[u8; SALT_LEN],
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
    passphrase: &str,
    iterations: u32,
) -> Result<Vec<u8>, EnvelopeError> {
    let key = keys::derive_key(passphrase, salt, iterations)?;
    crypto::open(&key, iv, ciphertext)
}

/// Seal a string into a text token.
pub(crate) fn seal_text(
    plaintext: &str,
    passphrase: &str,
    format: FormatVersion,
    iterations: u32,
) -> Result<String, EnvelopeError> {
    format.check_iterations(iterations)?;
    let sealed = seal_parts(plaintext.as_bytes(), passphrase, iterations)?;

    let mut body = Vec::with_capacity(
        V1_HEADER_LEN + SALT_LEN + IV_LEN + sealed.ciphertext.len(),
    );
    if let Some(version) = format.byte() {
        body.push(version);
        body.extend_from_slice(&iterations.to_be_bytes());
    }
    body.extend_from_slice(&sealed.salt);
    body.extend_from_slice(&sealed.iv);
    body.extend_from_slice(&sealed.ciphertext);

    let encoded = STANDARD.encode(&body);
    debug!(?format, plaintext_len = plaintext.len(), "sealed text envelope");

    Ok(match format.byte() {
        Some(version) => format!("v{version}{TAG_SEPARATOR}{encoded}"),
        None => encoded,
    })
}

/// Open a text token produced by `seal_text` in any known format.
///
/// Fails with `MalformedEnvelope` on bad framing, `UnsupportedVersion` on an
/// unknown tag, and `DecryptionFailed` when the tag does not verify. Never
/// returns an empty string in place of an error.
pub(crate) fn open_text(token: &str, passphrase: &str) -> Result<String, EnvelopeError> {
    let (format, encoded) = match token.split_once(TAG_SEPARATOR) {
        Some((tag, rest)) => (format::parse_text_tag(tag)?, rest),
        None => (FormatVersion::Legacy, token),
    };

    let bytes = STANDARD.decode(encoded.trim()).map_err(|e| {
        warn!(error = %e, "text envelope is not valid base64");
        EnvelopeError::MalformedEnvelope(format!("invalid base64: {e}"))
    })?;

    let (iterations, framed) = match format {
        FormatVersion::Legacy => (LEGACY_ITERATIONS, bytes.as_slice()),
        FormatVersion::V1 => split_v1_header(&bytes)?,
    };
    format.check_iterations(iterations)?;

    if framed.len() < MIN_LEGACY_LEN {
        warn!(len = framed.len(), "text envelope too short");
        return Err(EnvelopeError::MalformedEnvelope(format!(
            "decoded length {} is below the {MIN_LEGACY_LEN}-byte minimum",
            framed.len()
        )));
    }

    let (salt, rest) = framed.split_at(SALT_LEN);
    let (iv, ciphertext) = rest.split_at(IV_LEN);
    let salt: [u8; SALT_LEN] = salt
        .try_into()
        .map_err(|_| EnvelopeError::MalformedEnvelope("salt".into()))?;
    let iv: [u8; IV_LEN] = iv
        .try_into()
        .map_err(|_| EnvelopeError::MalformedEnvelope("iv".into()))?;

    let plaintext = open_parts(&salt, &iv, ciphertext, passphrase, iterations).inspect_err(|e| {
        if *e == EnvelopeError::DecryptionFailed {
            warn!(?format, "text envelope failed authentication");
        }
    })?;
    debug!(?format, plaintext_len = plaintext.len(), "opened text envelope");

    String::from_utf8(plaintext)
        .map_err(|_| EnvelopeError::MalformedEnvelope("plaintext is not valid UTF-8".into()))
}

fn split_v1_header(bytes: &[u8]) -> Result<(u32, &[u8]), EnvelopeError> {
    if bytes.len() < V1_HEADER_LEN {
        return Err(EnvelopeError::MalformedEnvelope("truncated v1 header".into()));
    }
    if FormatVersion::from_byte(bytes[0])? != FormatVersion::V1 {
        return Err(EnvelopeError::MalformedEnvelope("version byte mismatch".into()));
    }
    let mut count = [0u8; 4];
    count.copy_from_slice(&bytes[1..V1_HEADER_LEN]);
    Ok((u32::from_be_bytes(count), &bytes[V1_HEADER_LEN..]))
}
