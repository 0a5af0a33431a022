//! Secure string type for credential handling with automatic zeroization.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

/// A string wrapper that zeroizes its contents when dropped.
///
/// Used for the client secret and for access tokens so credentials do not
/// linger in memory after the client goes away.
#[derive(Clone, Default)]
pub struct SecureString(Zeroizing<String>);

impl SecureString {
    /// Creates a new `SecureString` from a `String`.
    pub fn new(s: String) -> Self {
        Self(Zeroizing::new(s))
    }

    /// Exposes the secret for use. Avoid copying the returned value;
    /// copies are not zeroized.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Returns true if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureString([REDACTED])")
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Serialize for SecureString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecureString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(SecureString::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_the_wrapped_value() {
        let secret = SecureString::from("my-client-secret");
        assert_eq!(secret.expose_secret(), "my-client-secret");
        assert!(!secret.is_empty());
    }

    #[test]
    fn debug_and_display_are_redacted() {
        let secret = SecureString::from("my-client-secret");
        assert!(!format!("{secret:?}").contains("my-client-secret"));
        assert!(!format!("{secret}").contains("my-client-secret"));
    }

    #[test]
    fn serde_round_trip() {
        let secret = SecureString::from("s3cr3t");
        let encoded = serde_json::to_string(&secret).unwrap();
        let decoded: SecureString = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.expose_secret(), "s3cr3t");
    }
}
