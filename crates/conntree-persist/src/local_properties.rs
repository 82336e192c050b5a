//! Per-user connection properties
//!
//! Display preferences kept outside the shared store: whether a node is a
//! favorite, should be connected on startup, or is expanded. Records are
//! keyed by node identity and stored as a JSON array.

use conntree_model::ConstantId;
use serde::{Deserialize, Serialize};

use crate::error::PersistError;
use crate::provider::Deserializer;

/// Local preferences for one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalConnectionProperties {
    /// Identity of the node these apply to
    pub connection_id: ConstantId,
    /// Connect on startup
    #[serde(default)]
    pub connected: bool,
    /// Marked favorite
    #[serde(default)]
    pub favorite: bool,
    /// Expanded in the tree view; containers only
    #[serde(default)]
    pub expanded: bool,
}

impl LocalConnectionProperties {
    /// Create record with all flags off
    #[inline]
    #[must_use]
    pub fn new(connection_id: impl Into<ConstantId>) -> Self {
        Self {
            connection_id: connection_id.into(),
            connected: false,
            favorite: false,
            expanded: false,
        }
    }
}

/// Decodes the JSON local properties format
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalConnectionPropertiesJsonDeserializer;

impl LocalConnectionPropertiesJsonDeserializer {
    /// Encode records in the format this deserializer reads
    ///
    /// # Errors
    /// [`PersistError::Decode`] if serialization fails
    pub fn serialize(records: &[LocalConnectionProperties]) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(records)?)
    }
}

impl Deserializer<String, Vec<LocalConnectionProperties>> for LocalConnectionPropertiesJsonDeserializer {
    fn deserialize(&self, input: String) -> Result<Vec<LocalConnectionProperties>, PersistError> {
        if input.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<LocalConnectionProperties> = serde_json::from_str(&input)?;
        tracing::debug!(records = records.len(), "decoded local connection properties");
        Ok(records)
    }
}
