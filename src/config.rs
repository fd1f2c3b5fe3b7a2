//! Writer configuration.
//!
//! Decides which format new envelopes are written in. Readers never consult
//! it: every known format is accepted on open.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;
use crate::format::{FormatVersion, MAX_ITERATIONS, MIN_ITERATIONS};
use crate::keys::LEGACY_ITERATIONS;

fn default_iterations() -> u32 {
    LEGACY_ITERATIONS
}

/// How new envelopes are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    /// Layout for new envelopes.
    #[serde(default)]
    pub format: FormatVersion,
    /// PBKDF2 iteration count for new envelopes.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            format: FormatVersion::Legacy,
            iterations: LEGACY_ITERATIONS,
        }
    }
}

impl EnvelopeConfig {
    /// Versioned envelopes at the given iteration count.
    pub fn v1(iterations: u32) -> Self {
        Self {
            format: FormatVersion::V1,
            iterations,
        }
    }

    /// Parse and validate a JSON document such as
    /// `{"format": "v1", "iterations": 210000}`.
    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EnvelopeError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EnvelopeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&contents)
    }

    /// Reject combinations the readers would refuse.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        match self.format {
            FormatVersion::Legacy if self.iterations != LEGACY_ITERATIONS => {
                Err(EnvelopeError::Config(format!(
                    "legacy format requires {LEGACY_ITERATIONS} iterations, got {}",
                    self.iterations
                )))
            }
            FormatVersion::V1 if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&self.iterations) => {
                Err(EnvelopeError::Config(format!(
                    "v1 iterations must be within {MIN_ITERATIONS}..={MAX_ITERATIONS}, got {}",
                    self.iterations
                )))
            }
            _ => Ok(()),
        }
    }
}
