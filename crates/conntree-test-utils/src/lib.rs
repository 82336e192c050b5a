//! Testing utilities for the conntree workspace
//!
//! Shared test helpers, fixtures, and an in-memory store.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use conntree_model::{ConnectionInfo, ConnectionTree, ConstantId, Protocol, RootNodeInfo};
use conntree_persist::{
    DataProvider, LocalConnectionProperties, LocalConnectionPropertiesJsonDeserializer,
    PersistError,
};
use conntree_security::{
    AesGcmCryptographyProvider, CredentialPrompt, CredentialRequestor, CryptographyProvider,
    SecretString,
};
use conntree_store::{DatabaseConnector, MetadataRecord, RawRow, SchemaVersion, StoreError, TreeSerializer};
use parking_lot::Mutex;

/// Provider with a cheap key derivation, for tests only
pub fn fast_crypto() -> Arc<AesGcmCryptographyProvider> {
    Arc::new(AesGcmCryptographyProvider::with_kdf_rounds(1))
}

pub fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_owned())
}

#[derive(Debug, Default)]
struct MemoryState {
    metadata: Option<MetadataRecord>,
    rows: Vec<RawRow>,
}

/// In-memory [`DatabaseConnector`] with failure injection
#[derive(Debug, Default)]
pub struct MemoryConnector {
    state: Mutex<MemoryState>,
    unreachable: AtomicBool,
    fail_metadata_write: AtomicBool,
    fail_row_read: AtomicBool,
    metadata_writes: AtomicUsize,
    row_reads: AtomicUsize,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Every operation fails with [`StoreError::Unreachable`]
    pub fn set_unreachable(&self, value: bool) {
        self.unreachable.store(value, Ordering::SeqCst);
    }

    pub fn set_fail_metadata_write(&self, value: bool) {
        self.fail_metadata_write.store(value, Ordering::SeqCst);
    }

    pub fn set_fail_row_read(&self, value: bool) {
        self.fail_row_read.store(value, Ordering::SeqCst);
    }

    pub fn metadata_writes(&self) -> usize {
        self.metadata_writes.load(Ordering::SeqCst)
    }

    pub fn row_reads(&self) -> usize {
        self.row_reads.load(Ordering::SeqCst)
    }

    pub fn metadata(&self) -> Option<MetadataRecord> {
        self.state.lock().metadata.clone()
    }

    /// Overwrite the stored schema version
    pub fn set_conf_version(&self, version: &str) {
        if let Some(metadata) = self.state.lock().metadata.as_mut() {
            metadata.conf_version = version.to_string();
        }
    }

    pub fn set_local_cache(&self, enabled: bool) {
        if let Some(metadata) = self.state.lock().metadata.as_mut() {
            metadata.local_cache = enabled;
        }
    }

    /// Drop the metadata record, keeping the rows
    pub fn clear_metadata(&self) {
        self.state.lock().metadata = None;
    }

    pub fn rows(&self) -> Vec<RawRow> {
        self.state.lock().rows.clone()
    }

    pub fn set_rows(&self, rows: Vec<RawRow>) {
        self.state.lock().rows = rows;
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Unreachable("memory store offline".to_string()));
        }
        Ok(())
    }
}

impl DatabaseConnector for MemoryConnector {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn read_metadata(&self) -> Result<Option<MetadataRecord>, StoreError> {
        self.check()?;
        Ok(self.state.lock().metadata.clone())
    }

    fn write_metadata(&self, record: &MetadataRecord) -> Result<(), StoreError> {
        self.check()?;
        if self.fail_metadata_write.load(Ordering::SeqCst) {
            return Err(StoreError::Unreachable("metadata is read-only".to_string()));
        }
        self.metadata_writes.fetch_add(1, Ordering::SeqCst);
        self.state.lock().metadata = Some(record.clone());
        Ok(())
    }

    fn read_rows(&self) -> Result<Vec<RawRow>, StoreError> {
        self.check()?;
        self.row_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_row_read.load(Ordering::SeqCst) {
            return Err(StoreError::Unreachable("row query failed".to_string()));
        }
        Ok(self.state.lock().rows.clone())
    }

    fn replace_rows(&self, rows: &[RawRow]) -> Result<(), StoreError> {
        self.check()?;
        self.state.lock().rows = rows.to_vec();
        Ok(())
    }

    fn is_local_cache_enabled(&self) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .metadata
            .as_ref()
            .is_some_and(|m| m.local_cache))
    }
}

/// Write `tree` into a store protected by `password`
pub fn seed_store(
    connector: &dyn DatabaseConnector,
    crypto: &dyn CryptographyProvider,
    tree: &ConnectionTree,
    password: &str,
    local_cache: bool,
) {
    let key = secret(password);
    let rows = TreeSerializer::new(crypto, &key)
        .serialize(tree)
        .expect("serialize tree");
    connector.replace_rows(&rows).expect("write rows");
    let marker = crypto
        .encrypt(RootNodeInfo::DEFAULT_PASSWORD, &key)
        .expect("encrypt marker");
    connector
        .write_metadata(&MetadataRecord {
            name: tree.root().name.clone(),
            export: false,
            protected: marker,
            conf_version: SchemaVersion::CURRENT.to_string(),
            local_cache,
        })
        .expect("write metadata");
}

/// Identities of the nodes in [`sample_tree`]
#[derive(Debug, Clone)]
pub struct SampleIds {
    pub root: ConstantId,
    pub servers: ConstantId,
    pub web: ConstantId,
    pub db: ConstantId,
    pub jump: ConstantId,
}

/// ```text
/// Connections
/// ├── Servers (container)
/// │   ├── web-01
/// │   └── db-01
/// └── jump
/// ```
pub fn sample_tree() -> (ConnectionTree, SampleIds) {
    let mut tree = ConnectionTree::new(RootNodeInfo::default());
    let root = tree.root_id().clone();
    let servers = tree.add_container(&root, "Servers").expect("servers");
    let web = tree
        .add_connection(&servers, "web-01", host("web-01.example", Protocol::Ssh2))
        .expect("web");
    let db = tree
        .add_connection(&servers, "db-01", host("db-01.example", Protocol::Rdp))
        .expect("db");
    let jump = tree
        .add_connection(&root, "jump", host("jump.example", Protocol::Ssh2))
        .expect("jump");
    (
        tree,
        SampleIds {
            root,
            servers,
            web,
            db,
            jump,
        },
    )
}

fn host(hostname: &str, protocol: Protocol) -> ConnectionInfo {
    ConnectionInfo {
        hostname: hostname.to_string(),
        protocol,
        username: "ops".to_string(),
        password: Some(format!("{hostname}-pw")),
        ..ConnectionInfo::default()
    }
}

/// Answers prompts from a script; `None` entries decline
#[derive(Debug, Default)]
pub struct ScriptedRequestor {
    answers: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<CredentialPrompt>>,
}

impl ScriptedRequestor {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(|a| a.map(Into::into)).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always(password: &str) -> Self {
        Self::new(std::iter::repeat(Some(password.to_string())).take(16))
    }

    pub fn prompts(&self) -> Vec<CredentialPrompt> {
        self.prompts.lock().clone()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

impl CredentialRequestor for ScriptedRequestor {
    fn request_credential(&self, prompt: &CredentialPrompt) -> Option<SecretString> {
        self.prompts.lock().push(prompt.clone());
        self.answers.lock().pop_front().flatten().map(SecretString::from)
    }
}

/// Fixed local properties payload
#[derive(Debug, Clone, Default)]
pub struct StaticDataProvider(pub String);

impl StaticDataProvider {
    pub fn from_records(records: &[LocalConnectionProperties]) -> Self {
        Self(LocalConnectionPropertiesJsonDeserializer::serialize(records).expect("serialize records"))
    }
}

impl DataProvider<String> for StaticDataProvider {
    fn load(&self) -> Result<String, PersistError> {
        Ok(self.0.clone())
    }
}

/// Provider whose medium is always broken
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingDataProvider;

impl DataProvider<String> for FailingDataProvider {
    fn load(&self) -> Result<String, PersistError> {
        Err(PersistError::io_error(
            "LocalConnectionProperties.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        ))
    }
}
