//! Stable node identity

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Store-assigned node identity
///
/// Opaque string, usually a UUID. Assigned once when a node is first saved
/// and kept for the node's whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstantId(String);

impl ConstantId {
    /// Generate a fresh random identity
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing identity string
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identity string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the identity is empty or whitespace
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for ConstantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConstantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ConstantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ConstantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
