//! Common types used throughout credvault.

use std::fmt;
use zeroize::Zeroize;

/// Account identifier.
///
/// The username names the account artifacts on disk, so it must be
/// non-empty and free of path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Create a new Username from a string.
    ///
    /// # Errors
    /// - Returns error if `name` is empty
    /// - Returns error if `name` contains a path separator or is a relative
    ///   path component (`.` / `..`)
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Username cannot be empty".to_string(),
            ));
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(crate::Error::InvalidInput(
                "Username cannot contain path separators".to_string(),
            ));
        }
        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cleartext string that zeroizes on drop.
///
/// Wiping is best effort: copies made by callers are not tracked.
#[derive(Clone, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct SensitiveString(String);

impl SensitiveString {
    /// Wrap a cleartext value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the cleartext.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Get the length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SensitiveString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SensitiveString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for SensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveString([REDACTED; {} bytes])", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_username_creation() {
        let name = Username::new("alice").unwrap();
        assert_eq!(name.as_str(), "alice");
        assert_eq!(name.to_string(), "alice");
    }

    #[test]
    fn test_username_empty_fails() {
        assert!(Username::new("").is_err());
    }

    #[test]
    fn test_username_rejects_separators() {
        assert!(Username::new("../etc").is_err());
        assert!(Username::new("a\\b").is_err());
        assert!(Username::new("..").is_err());
    }

    #[test]
    fn test_sensitive_string_redacted() {
        let secret = SensitiveString::new("hunter2");
        let shown = format!("{:?}", secret);
        assert!(!shown.contains("hunter2"));
        assert_eq!(secret.expose(), "hunter2");
        assert_eq!(secret.len(), 7);
    }

    proptest! {
        #[test]
        fn prop_plain_names_accepted(name in "[a-zA-Z0-9_.@-]{1,32}") {
            prop_assume!(name != "." && name != "..");
            let username = Username::new(name.clone()).unwrap();
            prop_assert_eq!(username.as_str(), name.as_str());
        }
    }
}
