//! SQL connection loader
//!
//! Loads the connection tree from the shared store and keeps a local cache
//! copy of it. Any failure on the store path falls back to that copy.
//!
//! # Workflow
//! 1. Read store metadata; a store without it gets default metadata first
//! 2. Confirm the store password against the metadata marker
//! 3. Verify the schema version
//! 4. Read and decrypt the rows into a tree
//! 5. Merge per-user local properties
//! 6. Write the cache copy if the store asks for one
//!
//! Failure in 1–6 marks the store unreachable and returns the cache copy.
//! Without a cache copy the store error is returned as is.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use conntree_model::{ConnectionTree, RootNodeInfo};
use conntree_persist::{
    CacheStore, DataProvider, Deserializer, FileDataProvider, LocalConnectionProperties,
    LocalConnectionPropertiesJsonDeserializer,
};
use conntree_security::{
    CancelRequestor, CredentialRequestor, CryptographyProvider, PasswordAuthenticator,
    SecretString,
};
use conntree_store::{
    DatabaseConnector, MetaDataRetriever, StoreError, StoreMetadata, TreeDeserializer,
    TreeSerializer, VersionVerifier,
};
use parking_lot::Mutex;

use crate::config::{CacheWritePolicy, LoaderConfig};
use crate::error::LoadError;
use crate::overlay::LocalOverlayMerger;

/// Loader wired to the JSON local properties file
pub type DefaultSqlConnectionsLoader =
    SqlConnectionsLoader<FileDataProvider, LocalConnectionPropertiesJsonDeserializer>;

/// Loads connection trees from a [`DatabaseConnector`]
pub struct SqlConnectionsLoader<P, D> {
    connector: Arc<dyn DatabaseConnector>,
    crypto: Arc<dyn CryptographyProvider>,
    requestor: Arc<dyn CredentialRequestor>,
    overlay: LocalOverlayMerger<P, D>,
    metadata: MetaDataRetriever,
    verifier: VersionVerifier,
    cache: CacheStore,
    config: LoaderConfig,
    reachable: AtomicBool,
    load_guard: Mutex<()>,
}

impl DefaultSqlConnectionsLoader {
    /// Create loader reading local properties from the configured file
    ///
    /// # Errors
    /// [`LoadError::Config`] if the configuration is invalid or a default
    /// path cannot be resolved
    pub fn from_config(
        connector: Arc<dyn DatabaseConnector>,
        crypto: Arc<dyn CryptographyProvider>,
        config: LoaderConfig,
    ) -> Result<Self, LoadError> {
        let provider = FileDataProvider::new(config.resolve_local_properties_path()?);
        Self::new(
            connector,
            crypto,
            provider,
            LocalConnectionPropertiesJsonDeserializer,
            config,
        )
    }
}

impl<P, D> SqlConnectionsLoader<P, D>
where
    P: DataProvider<String>,
    D: Deserializer<String, Vec<LocalConnectionProperties>>,
{
    /// Create loader
    ///
    /// Prompts are declined until a requestor is set with
    /// [`SqlConnectionsLoader::with_requestor`].
    ///
    /// # Errors
    /// [`LoadError::Config`] if the configuration is invalid or the cache
    /// path cannot be resolved
    pub fn new(
        connector: Arc<dyn DatabaseConnector>,
        crypto: Arc<dyn CryptographyProvider>,
        local_provider: P,
        local_deserializer: D,
        config: LoaderConfig,
    ) -> Result<Self, LoadError> {
        config.validate()?;
        let cache = CacheStore::new(config.resolve_cache_path()?, Arc::clone(&crypto))
            .with_filter(config.save_filter);
        Ok(Self {
            connector,
            crypto,
            requestor: Arc::new(CancelRequestor),
            overlay: LocalOverlayMerger::new(local_provider, local_deserializer),
            metadata: MetaDataRetriever::new(),
            verifier: config.version_verifier(),
            cache,
            config,
            reachable: AtomicBool::new(false),
            load_guard: Mutex::new(()),
        })
    }

    /// With password prompt
    #[inline]
    #[must_use]
    pub fn with_requestor(mut self, requestor: Arc<dyn CredentialRequestor>) -> Self {
        self.requestor = requestor;
        self
    }

    /// With metadata retriever used for reads and bootstrap
    #[inline]
    #[must_use]
    pub fn with_metadata_retriever(mut self, retriever: MetaDataRetriever) -> Self {
        self.metadata = retriever;
        self
    }

    /// Load the connection tree
    ///
    /// Loads on one loader run one at a time.
    ///
    /// # Errors
    /// - the store path error, unchanged, if the store path fails and there
    ///   is no cache copy
    /// - [`LoadError::CacheReadFailed`] if the store path fails and the
    ///   cache copy cannot be read
    pub fn load(&self) -> Result<ConnectionTree, LoadError> {
        let _guard = self.load_guard.lock();
        tracing::info!(store = %self.connector.describe(), "loading connections");

        match self.load_from_store() {
            Ok(tree) => {
                self.reachable.store(true, Ordering::Release);
                tracing::info!(nodes = tree.len(), "loaded connections from store");
                Ok(tree)
            }
            Err(remote) => {
                self.reachable.store(false, Ordering::Release);
                tracing::warn!(error = %remote, "store load failed; trying cache copy");
                self.load_from_cache(remote)
            }
        }
    }

    fn load_from_store(&self) -> Result<ConnectionTree, LoadError> {
        let metadata = self.read_or_bootstrap_metadata()?;
        let key = self.authenticate(&metadata)?;
        let version = self.verifier.verify_database_version(&metadata.conf_version)?;
        tracing::debug!(%version, "store version accepted");

        let rows = self
            .connector
            .read_rows()
            .map_err(LoadError::StoreUnreachable)?;
        let mut tree = TreeDeserializer::new(self.crypto.as_ref(), &key).deserialize(&rows)?;
        self.overlay.apply(&mut tree)?;

        if metadata.local_cache_enabled {
            self.write_cache(&tree)?;
        }
        Ok(tree)
    }

    fn read_or_bootstrap_metadata(&self) -> Result<StoreMetadata, LoadError> {
        let connector = self.connector.as_ref();
        if let Some(metadata) = self
            .metadata
            .get_database_metadata(connector)
            .map_err(LoadError::StoreUnreachable)?
        {
            return Ok(metadata);
        }

        tracing::info!(store = %connector.describe(), "no store metadata; writing defaults");
        let tree = ConnectionTree::new(RootNodeInfo::default());
        let key = SecretString::from(RootNodeInfo::DEFAULT_PASSWORD.to_owned());
        // Existing rows are kept; only an empty store gets a root row.
        if connector.read_rows().map_err(LoadError::Bootstrap)?.is_empty() {
            let rows = TreeSerializer::new(self.crypto.as_ref(), &key)
                .serialize(&tree)
                .map_err(LoadError::Bootstrap)?;
            connector.replace_rows(&rows).map_err(LoadError::Bootstrap)?;
        }
        self.metadata
            .write_database_metadata(tree.root(), &key, self.crypto.as_ref(), connector)
            .map_err(LoadError::Bootstrap)?;

        self.metadata
            .get_database_metadata(connector)
            .map_err(LoadError::Bootstrap)?
            .ok_or_else(|| {
                LoadError::Bootstrap(StoreError::Corrupt(
                    "metadata missing after bootstrap".to_string(),
                ))
            })
    }

    fn authenticate(&self, metadata: &StoreMetadata) -> Result<SecretString, LoadError> {
        let mut authenticator = PasswordAuthenticator::new(
            self.crypto.as_ref(),
            &metadata.protected,
            self.requestor.as_ref(),
        )
        .with_max_attempts(self.config.max_auth_attempts)
        .with_title(format!("Password for {}", metadata.name));

        let expected = SecretString::from(RootNodeInfo::DEFAULT_PASSWORD.to_owned());
        if !authenticator.authenticate(&expected) {
            return Err(LoadError::AuthenticationDeclined);
        }
        authenticator
            .take_last_authenticated_password()
            .ok_or(LoadError::AuthenticationDeclined)
    }

    fn write_cache(&self, tree: &ConnectionTree) -> Result<(), LoadError> {
        match self.cache.write(tree) {
            Ok(()) => Ok(()),
            Err(e) => match self.config.cache_write_policy {
                CacheWritePolicy::Fallback => Err(LoadError::CacheWriteFailed(e)),
                CacheWritePolicy::BestEffort => {
                    tracing::warn!(
                        path = %self.cache.path().display(),
                        error = %e,
                        "cache write failed; keeping store result"
                    );
                    Ok(())
                }
            },
        }
    }

    fn load_from_cache(&self, remote: LoadError) -> Result<ConnectionTree, LoadError> {
        match self.cache.read_if_present() {
            Ok(Some(tree)) => {
                tracing::info!(
                    path = %self.cache.path().display(),
                    nodes = tree.len(),
                    "loaded connections from cache copy"
                );
                Ok(tree)
            }
            Ok(None) => {
                tracing::warn!(path = %self.cache.path().display(), "no cache copy to fall back to");
                Err(remote)
            }
            Err(source) => Err(LoadError::CacheReadFailed {
                source,
                remote: Box::new(remote),
            }),
        }
    }
}

impl<P, D> SqlConnectionsLoader<P, D> {
    /// Whether the last load succeeded against the store
    ///
    /// `false` before the first load and after any fallback.
    #[inline]
    #[must_use]
    pub fn is_database_reachable(&self) -> bool {
        self.reachable.load(Ordering::Acquire)
    }

    /// Cache copy used by this loader
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }
}

impl<P, D> std::fmt::Debug for SqlConnectionsLoader<P, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlConnectionsLoader")
            .field("store", &self.connector.describe())
            .field("cache", &self.cache.path())
            .field("reachable", &self.is_database_reachable())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
