//! Loader configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! cache_path = "/var/lib/conntree/sqlcache.xml"
//! max_auth_attempts = 3
//! min_version = "2.7"
//! max_version = "2.7"
//! cache_write_policy = "fallback"
//!
//! [save_filter]
//! save_passwords = false
//! ```

use std::path::{Path, PathBuf};

use conntree_persist::{paths, SaveFilter};
use conntree_security::PasswordAuthenticator;
use conntree_store::{SchemaVersion, VersionVerifier};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What a failed cache write does to a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheWritePolicy {
    /// The load falls back to the previous cache copy
    #[default]
    Fallback,
    /// Log and return the freshly loaded tree
    BestEffort,
}

/// Loader settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Cache file; `<data-dir>/mRemoteNG/sqlcache.xml` when unset
    pub cache_path: Option<PathBuf>,
    /// Local properties file; `<data-dir>/mRemoteNG/LocalConnectionProperties.json` when unset
    pub local_properties_path: Option<PathBuf>,
    /// Password prompts per load
    pub max_auth_attempts: u32,
    /// Oldest store schema accepted
    pub min_version: SchemaVersion,
    /// Newest store schema accepted
    pub max_version: SchemaVersion,
    /// Effect of a cache write failure
    pub cache_write_policy: CacheWritePolicy,
    /// Fields kept in the cache copy
    pub save_filter: SaveFilter,
}

impl LoaderConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// [`ConfigError::Parse`] for bad TOML, [`ConfigError::Invalid`] for bad values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`LoaderConfig::from_toml_str`]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// With cache file
    #[inline]
    #[must_use]
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// With local properties file
    #[inline]
    #[must_use]
    pub fn with_local_properties_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_properties_path = Some(path.into());
        self
    }

    /// With prompt attempts
    #[inline]
    #[must_use]
    pub fn with_max_auth_attempts(mut self, attempts: u32) -> Self {
        self.max_auth_attempts = attempts;
        self
    }

    /// With supported schema range
    #[inline]
    #[must_use]
    pub fn with_version_range(mut self, min: SchemaVersion, max: SchemaVersion) -> Self {
        self.min_version = min;
        self.max_version = max;
        self
    }

    /// With cache write policy
    #[inline]
    #[must_use]
    pub fn with_cache_write_policy(mut self, policy: CacheWritePolicy) -> Self {
        self.cache_write_policy = policy;
        self
    }

    /// With cache save filter
    #[inline]
    #[must_use]
    pub fn with_save_filter(mut self, filter: SaveFilter) -> Self {
        self.save_filter = filter;
        self
    }

    /// Check values
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] if the version range is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_version > self.max_version {
            return Err(ConfigError::Invalid(format!(
                "min_version {} is above max_version {}",
                self.min_version, self.max_version
            )));
        }
        Ok(())
    }

    /// Cache file to use
    ///
    /// # Errors
    /// [`ConfigError::Paths`] if no path is set and the platform has no data directory
    pub fn resolve_cache_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.cache_path {
            Some(path) => Ok(path.clone()),
            None => Ok(paths::default_cache_path()?),
        }
    }

    /// Local properties file to use
    ///
    /// # Errors
    /// [`ConfigError::Paths`] if no path is set and the platform has no data directory
    pub fn resolve_local_properties_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.local_properties_path {
            Some(path) => Ok(path.clone()),
            None => Ok(paths::default_local_properties_path()?),
        }
    }

    /// Verifier for the configured range
    #[must_use]
    pub fn version_verifier(&self) -> VersionVerifier {
        VersionVerifier::with_range(self.min_version, self.max_version)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_path: None,
            local_properties_path: None,
            max_auth_attempts: PasswordAuthenticator::DEFAULT_MAX_ATTEMPTS,
            min_version: SchemaVersion::CURRENT,
            max_version: SchemaVersion::CURRENT,
            cache_write_policy: CacheWritePolicy::default(),
            save_filter: SaveFilter::default(),
        }
    }
}
