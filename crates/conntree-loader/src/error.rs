//! Error types for connection loading
//!
//! Every error raised on the store path ends in one fallback attempt to the
//! cache copy. Only [`LoadError::CacheReadFailed`] and configuration errors
//! are raised after that attempt.

use std::path::PathBuf;

use conntree_persist::{CacheError, PersistError};
use conntree_store::{DeserializeError, StoreError, VersionError};

/// Load failure
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Store could not be queried
    #[error("connection store unreachable: {0}")]
    StoreUnreachable(#[source] StoreError),

    /// Fresh store could not be initialised
    #[error("could not write initial store metadata: {0}")]
    Bootstrap(#[source] StoreError),

    /// No password confirmed against the store marker
    #[error("could not load connections: store password not confirmed")]
    AuthenticationDeclined,

    /// Store schema outside the supported range
    #[error("{0}")]
    VersionIncompatible(#[from] VersionError),

    /// Rows did not form a tree
    #[error("could not deserialize connections: {0}")]
    DeserializationFailed(#[from] DeserializeError),

    /// Local properties could not be read
    #[error("could not apply local connection properties: {0}")]
    LocalOverlay(#[from] PersistError),

    /// Cache copy could not be written
    #[error("could not write connection cache: {0}")]
    CacheWriteFailed(#[source] CacheError),

    /// Store path failed and the cache copy is unusable too
    #[error("cache fallback failed: {source} (store error: {remote})")]
    CacheReadFailed {
        /// Cache failure
        #[source]
        source: CacheError,
        /// Store path failure that triggered the fallback
        remote: Box<LoadError>,
    },

    /// Loader misconfigured
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl LoadError {
    /// Whether the error came from the store path
    #[inline]
    #[must_use]
    pub fn is_store_path(&self) -> bool {
        !matches!(self, Self::CacheReadFailed { .. } | Self::Config(_))
    }

    /// The store failure, for errors raised after a fallback attempt
    #[must_use]
    pub fn store_error(&self) -> Option<&LoadError> {
        match self {
            Self::CacheReadFailed { remote, .. } => Some(remote),
            _ if self.is_store_path() => Some(self),
            _ => None,
        }
    }
}

/// Configuration problems
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// Configuration file
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// TOML could not be decoded
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Default locations unavailable
    #[error("{0}")]
    Paths(#[from] PersistError),
}
