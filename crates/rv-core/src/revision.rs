//! Strongly-typed revision identifier.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Number of hex characters in a generated revision id.
const GENERATED_LEN: usize = 12;

/// Opaque, non-empty identifier of one migration step.
///
/// Revisions are compared as plain strings; no ordering between them is
/// implied by their value. Ordering comes from the chain linkage only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Revision(String);

impl<'de> Deserialize<'de> for Revision {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Revision::try_new(s).ok_or_else(|| serde::de::Error::custom("Revision must not be empty"))
    }
}

impl Revision {
    /// Create a new `Revision`, panicking if the id is empty.
    ///
    /// Prefer [`try_new`](Self::try_new) when handling untrusted input.
    pub fn new(id: impl Into<String>) -> Self {
        let s = id.into();
        assert!(!s.is_empty(), "Revision must not be empty");
        Self(s)
    }

    /// Try to create a new `Revision`, returning `None` if the id is empty.
    pub fn try_new(id: impl Into<String>) -> Option<Self> {
        let s = id.into();
        if s.is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Generate a fresh random revision id (12 lowercase hex characters).
    pub fn generate() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(hex[hex.len() - GENERATED_LEN..].to_string())
    }

    /// Return the underlying id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Render an optional revision, using `base` for the empty state.
pub fn display_revision(revision: Option<&Revision>) -> String {
    match revision {
        Some(rev) => rev.to_string(),
        None => "base".to_string(),
    }
}

/// [`display_revision`] for an owned `Option`, used in error messages.
pub(crate) fn display_opt(revision: &Option<Revision>) -> String {
    display_revision(revision.as_ref())
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Revision {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for Revision {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Revision {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Revision {
    type Error = &'static str;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Revision::try_new(s).ok_or("Revision must not be empty")
    }
}

impl PartialEq<str> for Revision {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Revision {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "revision_test.rs"]
mod tests;
