//! Store metadata: read, and write on first run

use conntree_model::TreeNode;
use conntree_security::{CryptographyProvider, SecretString};

use crate::connector::{DatabaseConnector, MetadataRecord};
use crate::error::StoreError;
use crate::version::SchemaVersion;

/// Metadata describing a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreMetadata {
    /// Root display name
    pub name: String,
    /// Export flag
    pub export: bool,
    /// Encrypted password marker
    pub protected: String,
    /// Schema version text as stored
    pub conf_version: String,
    /// Whether clients keep a local cache copy
    pub local_cache_enabled: bool,
}

impl From<MetadataRecord> for StoreMetadata {
    fn from(record: MetadataRecord) -> Self {
        Self {
            name: record.name,
            export: record.export,
            protected: record.protected,
            conf_version: record.conf_version,
            local_cache_enabled: record.local_cache,
        }
    }
}

/// Reads and bootstraps store metadata
#[derive(Debug, Clone, Copy)]
pub struct MetaDataRetriever {
    local_cache_default: bool,
}

impl MetaDataRetriever {
    /// Create retriever; bootstrapped stores enable local caching
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            local_cache_default: true,
        }
    }

    /// Set the cache flag written by [`MetaDataRetriever::write_database_metadata`]
    #[inline]
    #[must_use]
    pub const fn with_local_cache(mut self, enabled: bool) -> Self {
        self.local_cache_default = enabled;
        self
    }

    /// Read metadata, `None` for a fresh store
    ///
    /// # Errors
    /// [`StoreError`] if the store cannot be read, or the record has no marker
    pub fn get_database_metadata(
        &self,
        connector: &dyn DatabaseConnector,
    ) -> Result<Option<StoreMetadata>, StoreError> {
        let Some(record) = connector.read_metadata()? else {
            return Ok(None);
        };
        if record.protected.trim().is_empty() {
            return Err(StoreError::Corrupt("metadata has an empty marker".to_string()));
        }
        Ok(Some(record.into()))
    }

    /// Write metadata seeded from `root`
    ///
    /// The marker is the root's default password encrypted under `key`.
    /// Pass the default password as `key` for an unprotected store.
    ///
    /// # Errors
    /// - [`StoreError::InvalidInput`] if `root` is not a root node
    /// - [`StoreError::Crypto`] if the marker cannot be encrypted
    /// - any connector failure
    pub fn write_database_metadata(
        &self,
        root: &TreeNode,
        key: &SecretString,
        crypto: &dyn CryptographyProvider,
        connector: &dyn DatabaseConnector,
    ) -> Result<(), StoreError> {
        let info = root
            .root_info()
            .ok_or_else(|| StoreError::InvalidInput(format!("{} is not a root node", root.id())))?;
        let record = MetadataRecord {
            name: root.name.clone(),
            export: false,
            protected: crypto.encrypt(info.default_password(), key)?,
            conf_version: SchemaVersion::CURRENT.to_string(),
            local_cache: self.local_cache_default,
        };
        connector.write_metadata(&record)?;
        tracing::info!(store = %connector.describe(), version = %record.conf_version, "wrote store metadata");
        Ok(())
    }

    /// Whether the store asks clients to keep a cache copy
    ///
    /// # Errors
    /// Connector failure
    #[inline]
    pub fn is_local_cache_enabled(
        &self,
        connector: &dyn DatabaseConnector,
    ) -> Result<bool, StoreError> {
        connector.is_local_cache_enabled()
    }
}

impl Default for MetaDataRetriever {
    fn default() -> Self {
        Self::new()
    }
}
