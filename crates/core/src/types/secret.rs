//! Login secret type.

use secrecy::{ExposeSecret, SecretString};

/// A user's login secret.
///
/// The value is held in a [`SecretString`] and cannot be read back through
/// the public API; the only public operation is [`Secret::verify`].
/// Comparison is plaintext equality, matching the stored value exactly.
#[derive(Clone)]
pub struct Secret(SecretString);

impl Secret {
    /// Wrap a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Check a candidate against the stored secret.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        self.0.expose_secret() == candidate
    }

    /// Raw value for the flat-file writer.
    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}
