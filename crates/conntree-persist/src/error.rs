//! Error types for local persistence
//!
//! - [`PersistError`]: reading and decoding local sources
//! - [`CacheError`]: the cache copy of a connection tree

use std::path::PathBuf;

use conntree_security::CryptoError;

/// Errors reading or decoding a local source
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// File could not be read or written
    #[error("io error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Content is not in the expected format
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Platform has no per-user application data directory
    #[error("no application data directory on this platform")]
    NoDataDir,
}

impl PersistError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors on the cache file
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No cache file at the path
    #[error("no cache file at {0}")]
    NotFound(PathBuf),

    /// Cache file could not be read or written
    #[error("io error on cache {path}: {source}")]
    Io {
        /// Cache file
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Cache file exists but does not hold a valid tree
    #[error("cache {path} is corrupt: {source}")]
    Parse {
        /// Cache file
        path: PathBuf,
        /// Decode failure
        #[source]
        source: serde_json::Error,
    },

    /// Cached secrets could not be protected or recovered
    #[error("cache crypto failure: {0}")]
    Crypto(#[from] CryptoError),

    /// Cache content decoded but is not usable
    #[error("cache {path} is invalid: {reason}")]
    Invalid {
        /// Cache file
        path: PathBuf,
        /// What is wrong
        reason: String,
    },
}

impl CacheError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error only says no cache exists
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
