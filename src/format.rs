//! Envelope format versions.
//!
//! Unversioned ("legacy") envelopes carry no marker at all, so the only way
//! to evolve the KDF or cipher parameters without stranding existing rows is
//! an out-of-band tag that can never collide with legacy data:
//!
//! - Text tokens: legacy tokens are pure standard base64, which never
//!   contains `':'`. Versioned tokens are `"v<N>:" + base64(body)`, and the
//!   body itself starts with the version byte.
//! - Binary envelopes: the version travels in its own persisted field, which
//!   deserializes to `Legacy` for rows written before it existed.

use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;
use crate::keys::LEGACY_ITERATIONS;

/// Lowest PBKDF2 iteration count a versioned envelope may declare.
pub const MIN_ITERATIONS: u32 = 10_000;

/// Highest PBKDF2 iteration count a versioned envelope may declare. Bounds
/// the work a hostile token can force on `open`.
pub const MAX_ITERATIONS: u32 = 10_000_000;

/// Separator between the version tag and the base64 body of a text token.
pub(crate) const TAG_SEPARATOR: char = ':';

/// Which envelope layout a writer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatVersion {
    /// Unmarked layout, PBKDF2 fixed at 65536 iterations.
    #[default]
    Legacy,
    /// Tagged layout that records its own iteration count.
    V1,
}

impl FormatVersion {
    /// The version byte written into versioned bodies. Legacy has none.
    pub fn byte(self) -> Option<u8> {
        match self {
            Self::Legacy => None,
            Self::V1 => Some(1),
        }
    }

    /// Map a version byte read from storage.
    pub fn from_byte(byte: u8) -> Result<Self, EnvelopeError> {
        match byte {
            1 => Ok(Self::V1),
            other => Err(EnvelopeError::UnsupportedVersion(other)),
        }
    }

    /// Check that `iterations` is acceptable for this format.
    ///
    /// Legacy envelopes are pinned to 65536. Versioned envelopes must sit in
    /// `MIN_ITERATIONS..=MAX_ITERATIONS` so a crafted envelope can neither
    /// downgrade the KDF nor stall the reader.
    pub(crate) fn check_iterations(self, iterations: u32) -> Result<(), EnvelopeError> {
        match self {
            Self::Legacy if iterations != LEGACY_ITERATIONS => Err(
                EnvelopeError::MalformedEnvelope(format!(
                    "legacy envelope with iteration count {iterations}"
                )),
            ),
            Self::V1 if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&iterations) => Err(
                EnvelopeError::MalformedEnvelope(format!(
                    "iteration count {iterations} outside {MIN_ITERATIONS}..={MAX_ITERATIONS}"
                )),
            ),
            _ => Ok(()),
        }
    }
}

/// Parse the `v<N>` tag in front of a versioned text token.
///
/// `N` must be written canonically: decimal digits only, no sign, no leading
/// zero. `v01` and `v+1` are malformed rather than aliases of `v1`.
pub(crate) fn parse_text_tag(tag: &str) -> Result<FormatVersion, EnvelopeError> {
    let number = tag
        .strip_prefix('v')
        .filter(|n| {
            !n.is_empty() && !n.starts_with('0') && n.bytes().all(|b| b.is_ascii_digit())
        })
        .and_then(|n| n.parse::<u8>().ok())
        .ok_or_else(|| EnvelopeError::MalformedEnvelope(format!("unknown token tag {tag:?}")))?;
    FormatVersion::from_byte(number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_legacy() {
        assert_eq!(FormatVersion::default(), FormatVersion::Legacy);
    }

    #[test]
    fn version_bytes() {
        assert_eq!(FormatVersion::Legacy.byte(), None);
        assert_eq!(FormatVersion::V1.byte(), Some(1));
        assert_eq!(FormatVersion::from_byte(1).unwrap(), FormatVersion::V1);
        assert_eq!(
            FormatVersion::from_byte(7),
            Err(EnvelopeError::UnsupportedVersion(7))
        );
    }

    #[test]
    fn text_tags() {
        assert_eq!(parse_text_tag("v1").unwrap(), FormatVersion::V1);
        assert_eq!(parse_text_tag("v2"), Err(EnvelopeError::UnsupportedVersion(2)));
        assert!(matches!(
            parse_text_tag("x1"),
            Err(EnvelopeError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            parse_text_tag("v999"),
            Err(EnvelopeError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn non_canonical_tags_rejected() {
        for tag in ["v01", "v+1", "v", "v0", "v 1", "v1 ", "V1"] {
            assert!(
                matches!(parse_text_tag(tag), Err(EnvelopeError::MalformedEnvelope(_))),
                "accepted {tag:?}"
            );
        }
    }

    #[test]
    fn iteration_bounds() {
        assert!(FormatVersion::Legacy.check_iterations(LEGACY_ITERATIONS).is_ok());
        assert!(FormatVersion::Legacy.check_iterations(100_000).is_err());
        assert!(FormatVersion::V1.check_iterations(MIN_ITERATIONS).is_ok());
        assert!(FormatVersion::V1.check_iterations(MIN_ITERATIONS - 1).is_err());
        assert!(FormatVersion::V1.check_iterations(MAX_ITERATIONS + 1).is_err());
    }

    #[test]
    fn serde_names() {
        assert_eq!(serde_json::to_string(&FormatVersion::V1).unwrap(), "\"v1\"");
        let parsed: FormatVersion = serde_json::from_str("\"legacy\"").unwrap();
        assert_eq!(parsed, FormatVersion::Legacy);
    }
}
