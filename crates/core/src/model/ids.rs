use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Opaque identifier for an authenticated technician.
///
/// Issued by the identity service; the client never fabricates one outside
/// of tests.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Wraps an identity-service user id.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing ids and module keys from strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleKeyError {
    #[error("module key is empty")]
    Empty,

    #[error("module key {raw:?} contains invalid characters")]
    InvalidChars { raw: String },

    #[error("not a valid user id: {raw:?}")]
    InvalidUserId { raw: String },
}

impl FromStr for UserId {
    type Err = ModuleKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(UserId::new)
            .map_err(|_| ModuleKeyError::InvalidUserId { raw: s.to_string() })
    }
}

/// Key identifying a module or submodule row, e.g. `"residential"` or
/// `"floor"`.
///
/// Some keys denote a parent module and others a leaf; the parent/leaf
/// mapping lives in [`crate::catalog`], not in the key itself.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleKey(String);

impl ModuleKey {
    /// Validates and wraps a module key.
    ///
    /// Keys are non-empty, start with a lowercase letter, and contain only
    /// lowercase letters, digits, and underscores.
    ///
    /// # Errors
    ///
    /// Returns `ModuleKeyError` for an empty or malformed key.
    pub fn new(raw: impl Into<String>) -> Result<Self, ModuleKeyError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ModuleKeyError::Empty);
        }
        let mut chars = raw.chars();
        let head_ok = chars.next().is_some_and(|c| c.is_ascii_lowercase());
        let tail_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !head_ok || !tail_ok {
            return Err(ModuleKeyError::InvalidChars { raw });
        }
        Ok(Self(raw))
    }

    /// Wraps a key known at compile time (the catalog tables).
    ///
    /// Debug builds still assert validity so a typo in the catalog fails
    /// fast in tests.
    #[must_use]
    pub fn from_static(key: &'static str) -> Self {
        debug_assert!(Self::new(key).is_ok(), "invalid static module key: {key}");
        Self(key.to_string())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleKey({})", self.0)
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ModuleKey {
    type Err = ModuleKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_key_accepts_catalog_style_keys() {
        for key in ["residential", "stripwax", "floor", "duct", "safety"] {
            assert!(ModuleKey::new(key).is_ok(), "{key} should parse");
        }
    }

    #[test]
    fn module_key_rejects_bad_input() {
        assert_eq!(ModuleKey::new(""), Err(ModuleKeyError::Empty));
        assert!(ModuleKey::new("Floor").is_err());
        assert!(ModuleKey::new("floor cleaning").is_err());
        assert!(ModuleKey::new("1floor").is_err());
    }

    #[test]
    fn module_key_roundtrip() {
        let key: ModuleKey = "residential".parse().unwrap();
        assert_eq!(key.as_str(), "residential");
        assert_eq!(key.to_string().parse::<ModuleKey>().unwrap(), key);
    }

    #[test]
    fn user_id_parses_uuid() {
        let raw = "a1a2a3a4-b1b2-c1c2-d1d2-e1e2e3e4e5e6";
        let id: UserId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn user_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<UserId>().is_err());
    }
}
