//! Store tests against a SQLite database
//!
//! Covers metadata bootstrap and the rows → tree path.

use conntree_model::{ConnectionInfo, ConnectionTree, ConstantId, Protocol, RootNodeInfo};
use conntree_security::{
    AesGcmCryptographyProvider, CryptographyProvider, ExposeSecret, SecretString,
};
use conntree_store::{
    DatabaseConnector, DeserializeError, MetaDataRetriever, RawRow, SchemaVersion,
    SqliteConnector, StoreError, TreeDeserializer, TreeSerializer,
};
use pretty_assertions::assert_eq;

fn crypto() -> AesGcmCryptographyProvider {
    AesGcmCryptographyProvider::with_kdf_rounds(4)
}

fn key(s: &str) -> SecretString {
    SecretString::from(s.to_owned())
}

fn sample_tree() -> (ConnectionTree, ConstantId, ConstantId) {
    let mut tree = ConnectionTree::new(RootNodeInfo::default());
    let root = tree.root_id().clone();
    let group = tree.add_container(&root, "Production").unwrap();
    let info = ConnectionInfo {
        hostname: "db-01.internal".into(),
        protocol: Protocol::Ssh2,
        username: "ops".into(),
        password: Some("s3cret".into()),
        ..ConnectionInfo::default()
    };
    let host = tree.add_connection(&group, "db-01", info).unwrap();
    tree.add_connection(&root, "jumpbox", ConnectionInfo::default())
        .unwrap();
    tree.get_mut(&group).unwrap().set_expanded(true);
    tree.get_mut(&host).unwrap().favorite = true;
    (tree, group, host)
}

fn seeded_rows(password: &str) -> (ConnectionTree, Vec<RawRow>) {
    let (tree, _, _) = sample_tree();
    let crypto = crypto();
    let key = key(password);
    let rows = TreeSerializer::new(&crypto, &key).serialize(&tree).unwrap();
    (tree, rows)
}

#[test]
fn test_bootstrap_writes_default_metadata() {
    let store = SqliteConnector::open_in_memory().unwrap();
    let retriever = MetaDataRetriever::new();
    let crypto = crypto();
    assert!(retriever.get_database_metadata(&store).unwrap().is_none());

    let tree = ConnectionTree::new(RootNodeInfo::default());
    let default_key = key(RootNodeInfo::DEFAULT_PASSWORD);
    retriever
        .write_database_metadata(tree.root(), &default_key, &crypto, &store)
        .unwrap();

    let metadata = retriever.get_database_metadata(&store).unwrap().unwrap();
    assert_eq!(metadata.name, RootNodeInfo::DEFAULT_NAME);
    assert_eq!(metadata.conf_version, SchemaVersion::CURRENT.to_string());
    assert!(metadata.local_cache_enabled);
    assert!(retriever.is_local_cache_enabled(&store).unwrap());
    assert_eq!(
        crypto.decrypt(&metadata.protected, &default_key).unwrap(),
        RootNodeInfo::DEFAULT_PASSWORD
    );
}

#[test]
fn test_bootstrap_rejects_non_root() {
    let store = SqliteConnector::open_in_memory().unwrap();
    let (tree, group, _) = sample_tree();
    let err = MetaDataRetriever::new()
        .write_database_metadata(
            tree.get(&group).unwrap(),
            &key("k"),
            &crypto(),
            &store,
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidInput(_)));
}

#[test]
fn test_cache_flag_follows_retriever_setting() {
    let store = SqliteConnector::open_in_memory().unwrap();
    let tree = ConnectionTree::new(RootNodeInfo::default());
    MetaDataRetriever::new()
        .with_local_cache(false)
        .write_database_metadata(tree.root(), &key("k"), &crypto(), &store)
        .unwrap();
    assert!(!store.is_local_cache_enabled().unwrap());
}

#[test]
fn test_rows_rebuild_the_same_tree() {
    let store = SqliteConnector::open_in_memory().unwrap();
    let (tree, rows) = seeded_rows("pw");
    store.replace_rows(&rows).unwrap();

    let crypto = crypto();
    let key = key("pw");
    let loaded = TreeDeserializer::new(&crypto, &key)
        .deserialize(&store.read_rows().unwrap())
        .unwrap();

    assert_eq!(loaded, tree);
}

#[test]
fn test_payload_is_not_stored_in_clear() {
    let (_, rows) = seeded_rows("pw");
    assert!(rows.iter().all(|r| !r.payload.contains("s3cret")));
    assert!(rows.iter().all(|r| !r.payload.contains("db-01.internal")));
}

#[test]
fn test_wrong_key_fails_whole_tree() {
    let (_, rows) = seeded_rows("pw");
    let crypto = crypto();
    let wrong = key("other");
    let err = TreeDeserializer::new(&crypto, &wrong)
        .deserialize(&rows)
        .unwrap_err();
    assert!(matches!(err, DeserializeError::Decrypt { .. }));
}

#[test]
fn test_one_corrupt_row_fails_whole_tree() {
    let (_, mut rows) = seeded_rows("pw");
    rows[2].payload = "garbage".into();
    let crypto = crypto();
    let key = key("pw");
    let err = TreeDeserializer::new(&crypto, &key)
        .deserialize(&rows)
        .unwrap_err();
    assert!(matches!(err, DeserializeError::Decrypt { .. }));
}

#[test]
fn test_missing_root_is_rejected() {
    let (_, rows) = seeded_rows("pw");
    let crypto = crypto();
    let key = key("pw");
    let err = TreeDeserializer::new(&crypto, &key)
        .deserialize(&rows[1..])
        .unwrap_err();
    assert!(matches!(err, DeserializeError::MissingRoot));
}

#[test]
fn test_second_root_is_rejected() {
    let (_, mut rows) = seeded_rows("pw");
    let mut extra = rows[0].clone();
    extra.constant_id = "another-root".into();
    rows.push(extra);
    let crypto = crypto();
    let key = key("pw");
    let err = TreeDeserializer::new(&crypto, &key)
        .deserialize(&rows)
        .unwrap_err();
    assert!(matches!(err, DeserializeError::MultipleRoots(2)));
}

#[test]
fn test_unknown_parent_is_rejected() {
    let (_, mut rows) = seeded_rows("pw");
    rows[2].parent_id = Some("nowhere".into());
    let crypto = crypto();
    let key = key("pw");
    let err = TreeDeserializer::new(&crypto, &key)
        .deserialize(&rows)
        .unwrap_err();
    assert!(matches!(err, DeserializeError::UnknownParent { parent, .. } if parent == "nowhere"));
}

#[test]
fn test_unknown_node_type_is_rejected() {
    let (_, mut rows) = seeded_rows("pw");
    rows[1].node_type = "Folder".into();
    let crypto = crypto();
    let key = key("pw");
    let err = TreeDeserializer::new(&crypto, &key)
        .deserialize(&rows)
        .unwrap_err();
    assert!(matches!(err, DeserializeError::UnknownNodeType { value, .. } if value == "Folder"));
}

#[test]
fn test_parentless_rows_hang_under_root() {
    let (tree, mut rows) = seeded_rows("pw");
    for row in rows.iter_mut().skip(1) {
        if row.parent_id.as_deref() == Some(tree.root_id().as_str()) {
            row.parent_id = None;
        }
    }
    let crypto = crypto();
    let key = key("pw");
    let loaded = TreeDeserializer::new(&crypto, &key)
        .deserialize(&rows)
        .unwrap();
    assert_eq!(loaded, tree);
}

#[test]
fn test_siblings_follow_position() {
    let (tree, mut rows) = seeded_rows("pw");
    let root = tree.root_id().clone();
    // Swap the two children of the root.
    for row in rows.iter_mut() {
        if row.parent_id.as_deref() == Some(root.as_str()) {
            row.position = 1 - row.position;
        }
    }
    let crypto = crypto();
    let key = key("pw");
    let loaded = TreeDeserializer::new(&crypto, &key)
        .deserialize(&rows)
        .unwrap();
    let names: Vec<_> = loaded.children(&root).map(|n| n.name.clone()).collect();
    assert_eq!(names, vec!["jumpbox".to_string(), "Production".to_string()]);
}

#[test]
fn test_secret_never_leaks_through_debug() {
    let key = key("hunter2");
    assert!(!format!("{key:?}").contains("hunter2"));
    assert_eq!(key.expose_secret(), "hunter2");
}
