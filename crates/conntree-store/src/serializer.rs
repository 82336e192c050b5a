//! Connection tree → rows

use conntree_model::{ConnectionInfo, ConnectionTree, NodeKind, RootNodeInfo, TreeNode};
use conntree_security::{CryptographyProvider, SecretString};
use serde::{Deserialize, Serialize};

use crate::connector::{RawRow, RowKind};
use crate::error::StoreError;

/// Plain text form of a row payload
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct NodePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) root: Option<RootNodeInfo>,
    #[serde(default)]
    pub(crate) info: ConnectionInfo,
}

/// Turns a tree into store rows, encrypting payloads under `key`
pub struct TreeSerializer<'a> {
    crypto: &'a dyn CryptographyProvider,
    key: &'a SecretString,
}

impl<'a> TreeSerializer<'a> {
    /// Create serializer
    #[must_use]
    pub fn new(crypto: &'a dyn CryptographyProvider, key: &'a SecretString) -> Self {
        Self { crypto, key }
    }

    /// One row per node, root first, parents before children
    ///
    /// # Errors
    /// [`StoreError::Crypto`] or [`StoreError::Encoding`] if a payload
    /// cannot be produced
    pub fn serialize(&self, tree: &ConnectionTree) -> Result<Vec<RawRow>, StoreError> {
        let root = tree.root();
        let mut rows = Vec::with_capacity(tree.len());
        rows.push(self.row(root, 0)?);
        for id in tree.descendants(tree.root_id()) {
            let Some(node) = tree.get(&id) else {
                continue;
            };
            let position = node
                .parent()
                .and_then(|p| tree.get(p))
                .and_then(|p| p.children().iter().position(|c| c == &id))
                .unwrap_or_default();
            rows.push(self.row(node, i64::try_from(position).unwrap_or(i64::MAX))?);
        }
        Ok(rows)
    }

    fn row(&self, node: &TreeNode, position: i64) -> Result<RawRow, StoreError> {
        let (kind, expanded) = match node.kind() {
            NodeKind::Root(_) => (RowKind::Root, false),
            NodeKind::Container { expanded } => (RowKind::Container, *expanded),
            NodeKind::Connection => (RowKind::Connection, false),
        };
        let payload = NodePayload {
            root: node.root_info().cloned(),
            info: node.info.clone(),
        };
        let plain = serde_json::to_string(&payload)?;
        Ok(RawRow {
            constant_id: node.id().to_string(),
            parent_id: node.parent().map(ToString::to_string),
            node_type: kind.as_str().to_string(),
            name: node.name.clone(),
            position,
            expanded,
            favorite: node.favorite,
            connected: node.please_connect,
            payload: self.crypto.encrypt(&plain, self.key)?,
        })
    }
}

impl std::fmt::Debug for TreeSerializer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSerializer")
            .field("crypto", &self.crypto)
            .finish_non_exhaustive()
    }
}
