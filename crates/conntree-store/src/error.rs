//! Error types for store access
//!
//! - [`StoreError`]: the store could not be reached or answered nonsense
//! - [`VersionError`]: the store schema is not one this client reads
//! - [`DeserializeError`]: rows could not be turned into a tree

use conntree_model::TreeError;
use conntree_security::CryptoError;

use crate::version::SchemaVersion;

/// Errors talking to the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store could not be opened or reached
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// SQLite driver error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Stored data violates the expected layout
    #[error("corrupt store data: {0}")]
    Corrupt(String),

    /// Caller passed something the store cannot record
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Encrypting a value for the store failed
    #[error("encryption failed: {0}")]
    Crypto(#[from] CryptoError),

    /// Encoding a payload failed
    #[error("payload encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Schema version problems
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// Version text could not be parsed
    #[error("unparsable schema version: '{0}'")]
    Unparsable(String),

    /// Version outside the supported range
    #[error("incompatible schema version {found} (supported: {min} to {max})")]
    Unsupported {
        /// Version the store reports
        found: SchemaVersion,
        /// Lowest supported
        min: SchemaVersion,
        /// Highest supported
        max: SchemaVersion,
    },
}

/// Errors rebuilding a tree from rows
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    /// Row payload did not decrypt with the key
    #[error("row {id}: payload did not decrypt: {source}")]
    Decrypt {
        id: String,
        #[source]
        source: CryptoError,
    },

    /// Decrypted payload is not valid
    #[error("row {id}: invalid payload: {source}")]
    Payload {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Row has an unknown node type
    #[error("row {id}: unknown node type '{value}'")]
    UnknownNodeType { id: String, value: String },

    /// Row has no identity
    #[error("row without identity (name: '{name}')")]
    MissingId { name: String },

    /// Row references a parent that does not exist
    #[error("row {id}: parent {parent} not found")]
    UnknownParent { id: String, parent: String },

    /// No root row
    #[error("no root row")]
    MissingRoot,

    /// More than one root row
    #[error("{0} root rows (expected exactly one)")]
    MultipleRoots(usize),

    /// Rows do not form a valid tree
    #[error("invalid tree: {0}")]
    Tree(#[from] TreeError),
}
