//! Cache copy of a connection tree
//!
//! After every successful store load the tree is written to a local file
//! so it can still be opened when the store is unreachable. The file is a
//! JSON document:
//!
//! ```text
//! { "confVersion": "2.7", "protected": <marker>, "tree": { ... } }
//! ```
//!
//! Connection passwords are encrypted under the root's default password, and
//! `protected` is that password encrypted under itself, so a reader can tell
//! a wrong provider from a corrupt file. Writes go to a temporary file in the
//! same directory which then replaces the cache in one rename.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use conntree_model::ConnectionTree;
use conntree_security::{CryptographyProvider, ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Format version written into new cache files
pub const CACHE_CONF_VERSION: &str = "2.7";

/// Which connection fields go into the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveFilter {
    /// Keep usernames
    pub save_usernames: bool,
    /// Keep (encrypted) passwords
    pub save_passwords: bool,
    /// Keep domains
    pub save_domains: bool,
}

impl SaveFilter {
    /// Filter that drops every credential field
    #[inline]
    #[must_use]
    pub const fn without_credentials() -> Self {
        Self {
            save_usernames: false,
            save_passwords: false,
            save_domains: false,
        }
    }
}

impl Default for SaveFilter {
    fn default() -> Self {
        Self {
            save_usernames: true,
            save_passwords: true,
            save_domains: true,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheDocument {
    conf_version: String,
    protected: String,
    tree: ConnectionTree,
}

/// Reads and writes the cache file at one path
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
    crypto: Arc<dyn CryptographyProvider>,
    filter: SaveFilter,
}

impl CacheStore {
    /// Create store for the cache file at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, crypto: Arc<dyn CryptographyProvider>) -> Self {
        Self {
            path: path.into(),
            crypto,
            filter: SaveFilter::default(),
        }
    }

    /// Set the save filter
    #[inline]
    #[must_use]
    pub fn with_filter(mut self, filter: SaveFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Cache file location
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a cache file is present
    #[inline]
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replace the cache with `tree`
    ///
    /// # Errors
    /// - [`CacheError::Crypto`] if a password cannot be encrypted
    /// - [`CacheError::Io`] if the file cannot be written
    pub fn write(&self, tree: &ConnectionTree) -> Result<(), CacheError> {
        let key = cache_key(tree);
        let mut copy = tree.clone();
        for node in copy.iter_mut() {
            let info = &mut node.info;
            if !self.filter.save_usernames {
                info.username.clear();
            }
            if !self.filter.save_domains {
                info.domain.clear();
            }
            info.password = match info.password.take() {
                Some(plain) if self.filter.save_passwords => {
                    Some(self.crypto.encrypt(&plain, &key)?)
                }
                _ => None,
            };
        }
        let document = CacheDocument {
            conf_version: CACHE_CONF_VERSION.to_string(),
            protected: self.crypto.encrypt(key.expose_secret(), &key)?,
            tree: copy,
        };
        let bytes = serde_json::to_vec_pretty(&document).map_err(|source| CacheError::Parse {
            path: self.path.clone(),
            source,
        })?;
        self.replace_file(&bytes)?;
        tracing::info!(path = %self.path.display(), nodes = tree.len(), "wrote connection cache");
        Ok(())
    }

    /// Read the cache
    ///
    /// # Errors
    /// - [`CacheError::NotFound`] if there is no cache file
    /// - [`CacheError::Parse`] / [`CacheError::Invalid`] for a corrupt file
    /// - [`CacheError::Crypto`] if cached passwords cannot be decrypted
    pub fn read(&self) -> Result<ConnectionTree, CacheError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(CacheError::io_error(&self.path, e)),
        };
        let document: CacheDocument =
            serde_json::from_slice(&bytes).map_err(|source| CacheError::Parse {
                path: self.path.clone(),
                source,
            })?;

        let mut tree = document.tree;
        let key = cache_key(&tree);
        let marker = self
            .crypto
            .decrypt(&document.protected, &key)
            .map_err(|e| self.invalid(format!("marker does not decrypt: {e}")))?;
        if marker != key.expose_secret() {
            return Err(self.invalid("marker mismatch".to_string()));
        }
        for node in tree.iter_mut() {
            if let Some(cipher) = node.info.password.take() {
                node.info.password = Some(self.crypto.decrypt(&cipher, &key)?);
            }
        }
        tracing::info!(path = %self.path.display(), nodes = tree.len(), "read connection cache");
        Ok(tree)
    }

    /// Read the cache, `None` when there is no cache file
    ///
    /// # Errors
    /// Same as [`CacheStore::read`], except a missing file
    pub fn read_if_present(&self) -> Result<Option<ConnectionTree>, CacheError> {
        match self.read() {
            Ok(tree) => Ok(Some(tree)),
            Err(CacheError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn replace_file(&self, bytes: &[u8]) -> Result<(), CacheError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| CacheError::io_error(dir, e))?;
        let mut temp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| CacheError::io_error(dir, e))?;
        temp.write_all(bytes)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| CacheError::io_error(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| CacheError::io_error(&self.path, e.error))?;
        Ok(())
    }

    fn invalid(&self, reason: String) -> CacheError {
        CacheError::Invalid {
            path: self.path.clone(),
            reason,
        }
    }
}

fn cache_key(tree: &ConnectionTree) -> SecretString {
    let password = tree
        .root()
        .root_info()
        .map_or(conntree_model::RootNodeInfo::DEFAULT_PASSWORD, |info| {
            info.default_password()
        });
    SecretString::from(password.to_owned())
}
