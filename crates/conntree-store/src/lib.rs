//! Shared SQL store access
//!
//! The store holds two things:
//!
//! - **metadata** (one record): display name, schema version, the encrypted
//!   password marker and whether clients keep a local cache copy
//! - **rows**: one per tree node, with the node's properties encrypted under
//!   the store password
//!
//! ```text
//! DatabaseConnector ──▶ MetaDataRetriever ──▶ StoreMetadata ──▶ VersionVerifier
//!         │
//!         └──────────▶ RawRow[] ──▶ TreeDeserializer(key) ──▶ ConnectionTree
//! ```
//!
//! [`DatabaseConnector`] is the driver seam; [`SqliteConnector`] is the
//! bundled implementation.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod connector;
pub mod deserializer;
pub mod error;
pub mod metadata;
pub mod serializer;
pub mod sqlite;
pub mod version;

pub use connector::{DatabaseConnector, MetadataRecord, RawRow, RowKind, UnreachableConnector};
pub use deserializer::TreeDeserializer;
pub use error::{DeserializeError, StoreError, VersionError};
pub use metadata::{MetaDataRetriever, StoreMetadata};
pub use serializer::TreeSerializer;
pub use sqlite::SqliteConnector;
pub use version::{SchemaVersion, VersionVerifier};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
