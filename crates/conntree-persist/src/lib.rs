//! Local persistence for connection trees
//!
//! Everything here lives on the user's machine, never in the shared store:
//!
//! - [`CacheStore`]: the cache copy written after each successful store load
//!   and read back when the store is unavailable
//! - [`LocalConnectionProperties`]: per-user favorite / auto-connect /
//!   expanded flags, read through a [`DataProvider`] and a [`Deserializer`]
//! - [`paths`]: default locations under the per-user data directory
//!
//! ```text
//! FileDataProvider ──String──▶ LocalConnectionPropertiesJsonDeserializer ──▶ Vec<LocalConnectionProperties>
//!
//! ConnectionTree ──▶ CacheStore::write ──▶ <data-dir>/mRemoteNG/sqlcache.xml
//!                    CacheStore::read  ◀──┘
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod error;
pub mod local_properties;
pub mod paths;
pub mod provider;

pub use cache::{CacheStore, SaveFilter, CACHE_CONF_VERSION};
pub use error::{CacheError, PersistError};
pub use local_properties::{LocalConnectionProperties, LocalConnectionPropertiesJsonDeserializer};
pub use provider::{DataProvider, Deserializer, FileDataProvider};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
