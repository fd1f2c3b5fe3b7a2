//! Login credential hashing.
//!
//! Stored as a self-describing string:
//!
//! ```text
//! pbkdf2-sha256$<iterations>$<salt, base64>$<hash, base64>
//! ```
//!
//! The stored string is also the usual `secret` half of a `Principal`, so
//! a password change rotates every envelope passphrase with it.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::crypto;
use crate::error::EnvelopeError;
use crate::keys;

const SCHEME: &str = "pbkdf2-sha256";

/// Iteration count for newly hashed passwords.
pub const PASSWORD_ITERATIONS: u32 = 210_000;

const PASSWORD_SALT_LEN: usize = 16;
const PASSWORD_HASH_LEN: usize = 32;

/// A parsed login credential hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PasswordHash {
    iterations: NonZeroU32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl PasswordHash {
    /// PBKDF2 iteration count this hash was produced with.
    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SCHEME}${}${}${}",
            self.iterations,
            STANDARD_NO_PAD.encode(&self.salt),
            STANDARD_NO_PAD.encode(&self.hash)
        )
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHash")
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

impl FromStr for PasswordHash {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |what: &str| EnvelopeError::InvalidCredential(what.to_string());

        let mut parts = s.split('$');
        let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(invalid("expected four '$'-separated fields"));
        };

        if scheme != SCHEME {
            return Err(invalid("unknown scheme"));
        }
        let iterations = iterations
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| invalid("iteration count"))?;
        let salt = STANDARD_NO_PAD
            .decode(salt)
            .map_err(|_| invalid("salt encoding"))?;
        let hash = STANDARD_NO_PAD
            .decode(hash)
            .map_err(|_| invalid("hash encoding"))?;
        if salt.is_empty() || hash.is_empty() {
            return Err(invalid("empty salt or hash"));
        }

        Ok(Self {
            iterations,
            salt,
            hash,
        })
    }
}

impl TryFrom<String> for PasswordHash {
    type Error = EnvelopeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PasswordHash> for String {
    fn from(hash: PasswordHash) -> Self {
        hash.to_string()
    }
}

/// Hash a login password with a fresh salt.
pub fn hash_password(password: &str) -> Result<PasswordHash, EnvelopeError> {
    hash_password_with(password, PASSWORD_ITERATIONS)
}

/// Hash a login password at a specific iteration count.
pub fn hash_password_with(password: &str, iterations: u32) -> Result<PasswordHash, EnvelopeError> {
    let iterations = NonZeroU32::new(iterations).ok_or(EnvelopeError::KeyDerivation)?;
    let salt: [u8; PASSWORD_SALT_LEN] = crypto::random_array()?;

    let mut hash = vec![0u8; PASSWORD_HASH_LEN];
    keys::derive_raw(password.as_bytes(), &salt, iterations, &mut hash);

    Ok(PasswordHash {
        iterations,
        salt: salt.to_vec(),
        hash,
    })
}

/// Check `password` against a stored hash in constant time.
pub fn verify_password(password: &str, stored: &PasswordHash) -> bool {
    keys::verify_raw(
        password.as_bytes(),
        &stored.salt,
        stored.iterations,
        &stored.hash,
    )
}
