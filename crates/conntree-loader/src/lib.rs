//! Connection tree loading with local cache fallback
//!
//! [`SqlConnectionsLoader`] reads the tree from a shared SQL store, merges
//! per-user properties onto it and keeps a cache copy on disk. When the
//! store cannot be used (unreachable, wrong password, unsupported schema,
//! corrupt rows) the cache copy is returned instead.
//!
//! # Architecture
//!
//! ```text
//! DatabaseConnector ─▶ metadata ─▶ password ─▶ version ─▶ rows ─▶ tree
//!                                                                  │
//!                                        LocalOverlayMerger ◀──────┤
//!                                        CacheStore::write  ◀──────┘
//!
//!      any failure ─▶ CacheStore::read_if_present ─▶ tree | original error
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use conntree_loader::{DefaultSqlConnectionsLoader, LoaderConfig};
//! use conntree_security::AesGcmCryptographyProvider;
//! use conntree_store::SqliteConnector;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(SqliteConnector::open("connections.db")?);
//! let loader = DefaultSqlConnectionsLoader::from_config(
//!     store,
//!     Arc::new(AesGcmCryptographyProvider::new()),
//!     LoaderConfig::default(),
//! )?;
//!
//! let tree = loader.load()?;
//! println!("{} nodes, store reachable: {}", tree.len(), loader.is_database_reachable());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod loader;
pub mod overlay;

pub use config::{CacheWritePolicy, LoaderConfig};
pub use error::{ConfigError, LoadError};
pub use loader::{DefaultSqlConnectionsLoader, SqlConnectionsLoader};
pub use overlay::{apply_local_connection_properties, LocalOverlayMerger};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
