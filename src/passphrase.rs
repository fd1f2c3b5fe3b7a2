//! Per-principal passphrases.
//!
//! The envelope layer treats the passphrase as an opaque string. In the
//! application it is composed from account identifiers (login plus stored
//! password hash, or login plus account id), which is what `Principal` does.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret passphrase. Zeroised on drop, redacted in `Debug` and `Display`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Passphrase {
    inner: String,
}

impl Passphrase {
    /// Wrap a secret string.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            inner: secret.into(),
        }
    }

    /// The secret itself, for handing to key derivation.
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// True if the secret is the empty string.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<&str> for Passphrase {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Passphrase {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Passphrase")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl fmt::Display for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED {} bytes]", self.inner.len())
    }
}

/// Supplies the passphrase for the principal whose records are being read
/// or written.
pub trait PassphraseProvider: Send + Sync {
    /// A fresh copy of the passphrase; dropped (and zeroised) after use.
    fn passphrase(&self) -> Passphrase;
}

impl PassphraseProvider for Passphrase {
    fn passphrase(&self) -> Passphrase {
        self.clone()
    }
}

/// An authenticated account, composed into a passphrase as
/// `login ‖ separator ‖ secret`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Principal {
    login: String,
    secret: String,
    separator: String,
}

impl Principal {
    /// Default composition: `"{login}:{secret}"`.
    pub fn new(login: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::with_separator(login, secret, ":")
    }

    /// Compose as `"{login}{separator}{secret}"`.
    pub fn with_separator(
        login: impl Into<String>,
        secret: impl Into<String>,
        separator: impl Into<String>,
    ) -> Self {
        Self {
            login: login.into(),
            secret: secret.into(),
            separator: separator.into(),
        }
    }

    /// The account login. Not secret.
    pub fn login(&self) -> &str {
        &self.login
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

impl PassphraseProvider for Principal {
    fn passphrase(&self) -> Passphrase {
        Passphrase::new(format!("{}{}{}", self.login, self.separator, self.secret))
    }
}
