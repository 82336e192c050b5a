//! Driver seam for the shared store

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// The store-level metadata record, as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Root display name
    pub name: String,
    /// Export flag carried over from the root
    pub export: bool,
    /// Encrypted password marker
    pub protected: String,
    /// Schema version text, e.g. `2.7`
    pub conf_version: String,
    /// Whether clients keep a local cache copy
    pub local_cache: bool,
}

/// Kind column of a node row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    /// The tree root
    Root,
    /// A container
    Container,
    /// A connection
    Connection,
}

impl RowKind {
    /// Column text for this kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::Container => "Container",
            Self::Connection => "Connection",
        }
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Root" => Ok(Self::Root),
            "Container" => Ok(Self::Container),
            "Connection" => Ok(Self::Connection),
            other => Err(other.to_string()),
        }
    }
}

/// One node row, as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// Node identity
    pub constant_id: String,
    /// Parent identity; `None` hangs the node under the root
    pub parent_id: Option<String>,
    /// Node kind column (`Root`, `Container`, `Connection`)
    pub node_type: String,
    /// Display name
    pub name: String,
    /// Order among siblings
    pub position: i64,
    /// Container expanded state
    pub expanded: bool,
    /// Favorite flag
    pub favorite: bool,
    /// Auto-connect flag
    pub connected: bool,
    /// Encrypted node properties
    pub payload: String,
}

/// Access to a shared store
///
/// Implementations report connection and query failures as
/// [`StoreError`]; they never interpret or decrypt what they return.
pub trait DatabaseConnector: Send + Sync {
    /// Human-readable description of the target, for logs
    fn describe(&self) -> String;

    /// Read the metadata record, `None` on a fresh store
    ///
    /// # Errors
    /// Connection or query failure
    fn read_metadata(&self) -> Result<Option<MetadataRecord>, StoreError>;

    /// Replace the metadata record
    ///
    /// # Errors
    /// Connection or query failure
    fn write_metadata(&self, record: &MetadataRecord) -> Result<(), StoreError>;

    /// Read every node row
    ///
    /// # Errors
    /// Connection or query failure
    fn read_rows(&self) -> Result<Vec<RawRow>, StoreError>;

    /// Replace all node rows
    ///
    /// # Errors
    /// Connection or query failure
    fn replace_rows(&self, rows: &[RawRow]) -> Result<(), StoreError>;

    /// Whether clients should keep a local cache copy
    ///
    /// # Errors
    /// Connection or query failure
    fn is_local_cache_enabled(&self) -> Result<bool, StoreError>;
}

/// Connector for a store that could not be opened
///
/// Every call fails with [`StoreError::Unreachable`], so a loader built on
/// it goes straight to its fallback.
#[derive(Debug, Clone)]
pub struct UnreachableConnector {
    target: String,
    reason: String,
}

impl UnreachableConnector {
    /// Create connector for `target` that failed with `reason`
    #[must_use]
    pub fn new(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> Result<T, StoreError> {
        Err(StoreError::Unreachable(format!("{}: {}", self.target, self.reason)))
    }
}

impl DatabaseConnector for UnreachableConnector {
    fn describe(&self) -> String {
        format!("{} (unreachable)", self.target)
    }

    fn read_metadata(&self) -> Result<Option<MetadataRecord>, StoreError> {
        self.fail()
    }

    fn write_metadata(&self, _record: &MetadataRecord) -> Result<(), StoreError> {
        self.fail()
    }

    fn read_rows(&self) -> Result<Vec<RawRow>, StoreError> {
        self.fail()
    }

    fn replace_rows(&self, _rows: &[RawRow]) -> Result<(), StoreError> {
        self.fail()
    }

    fn is_local_cache_enabled(&self) -> Result<bool, StoreError> {
        self.fail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_connector_fails_everything() {
        let c = UnreachableConnector::new("db.sqlite", "no such file");
        assert!(matches!(c.read_metadata(), Err(StoreError::Unreachable(m)) if m.contains("no such file")));
        assert!(c.read_rows().is_err());
        assert!(c.is_local_cache_enabled().is_err());
        assert!(c.describe().contains("db.sqlite"));
    }

    #[test]
    fn row_kind_text_round_trips() {
        for kind in [RowKind::Root, RowKind::Container, RowKind::Connection] {
            assert_eq!(kind.as_str().parse::<RowKind>(), Ok(kind));
        }
        assert_eq!("Folder".parse::<RowKind>(), Err("Folder".to_string()));
    }
}
