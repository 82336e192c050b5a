//! Rows → connection tree
//!
//! Every row payload is decrypted with the confirmed store key. One bad row
//! fails the whole tree; no partial trees are returned.

use std::collections::{HashMap, HashSet};

use conntree_model::{
    ConnectionInfo, ConnectionTree, ConstantId, RootNodeInfo, TreeError, TreeNode,
};
use conntree_security::{CryptographyProvider, SecretString};

use crate::connector::{RawRow, RowKind};
use crate::error::DeserializeError;
use crate::serializer::NodePayload;

/// Rebuilds a [`ConnectionTree`] from store rows
pub struct TreeDeserializer<'a> {
    crypto: &'a dyn CryptographyProvider,
    key: &'a SecretString,
}

struct DecodedRow {
    kind: RowKind,
    parent: Option<String>,
    position: i64,
    node: TreeNode,
}

impl<'a> TreeDeserializer<'a> {
    /// Create deserializer for rows encrypted under `key`
    #[must_use]
    pub fn new(crypto: &'a dyn CryptographyProvider, key: &'a SecretString) -> Self {
        Self { crypto, key }
    }

    /// Build the tree
    ///
    /// Rows without a parent hang under the root; siblings are ordered by
    /// `position`, then by row order.
    ///
    /// # Errors
    /// [`DeserializeError`] on any undecryptable row, bad payload, unknown
    /// node type, missing or duplicate root, unknown parent, or structure
    /// that is not a tree
    pub fn deserialize(&self, rows: &[RawRow]) -> Result<ConnectionTree, DeserializeError> {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in rows {
            if !seen.insert(row.constant_id.as_str()) {
                return Err(TreeError::DuplicateId(ConstantId::new(&row.constant_id)).into());
            }
        }

        let mut decoded = rows
            .iter()
            .map(|row| self.decode(row).map(Some))
            .collect::<Result<Vec<_>, _>>()?;

        let root_index = {
            let mut roots = decoded
                .iter()
                .enumerate()
                .filter(|(_, d)| matches!(d, Some(d) if d.kind == RowKind::Root))
                .map(|(i, _)| i);
            let first = roots.next().ok_or(DeserializeError::MissingRoot)?;
            let extra = roots.count();
            if extra > 0 {
                return Err(DeserializeError::MultipleRoots(extra + 1));
            }
            first
        };
        let Some(root) = decoded[root_index].take() else {
            return Err(DeserializeError::MissingRoot);
        };
        let root_id = root.node.id().as_str().to_owned();
        let mut tree = ConnectionTree::with_root(root.node)?;

        let mut by_parent: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, entry) in decoded.iter().enumerate() {
            if let Some(entry) = entry {
                let parent = entry.parent.as_deref().unwrap_or(&root_id);
                by_parent.entry(parent).or_default().push(index);
            }
        }
        let mut by_parent: HashMap<String, Vec<usize>> = by_parent
            .into_iter()
            .map(|(parent, mut children)| {
                children.sort_by_key(|&i| decoded[i].as_ref().map_or(0, |d| d.position));
                (parent.to_owned(), children)
            })
            .collect();

        let mut queue = vec![root_id];
        while let Some(parent) = queue.pop() {
            let Some(children) = by_parent.remove(&parent) else {
                continue;
            };
            let parent_id = ConstantId::new(parent);
            for index in children {
                let Some(entry) = decoded[index].take() else {
                    continue;
                };
                queue.push(entry.node.id().as_str().to_owned());
                tree.insert(&parent_id, entry.node)?;
            }
        }

        // Whatever was not placed hangs off a missing parent or a cycle.
        if let Some(left) = decoded.iter().flatten().next() {
            let id = left.node.id().as_str().to_owned();
            return Err(match &left.parent {
                Some(parent) if !seen.contains(parent.as_str()) => DeserializeError::UnknownParent {
                    id,
                    parent: parent.clone(),
                },
                _ => TreeError::Unreachable(ConstantId::new(id)).into(),
            });
        }

        tracing::debug!(nodes = tree.len(), "deserialized connection tree");
        Ok(tree)
    }

    fn decode(&self, row: &RawRow) -> Result<DecodedRow, DeserializeError> {
        if row.constant_id.trim().is_empty() {
            return Err(DeserializeError::MissingId {
                name: row.name.clone(),
            });
        }
        let kind: RowKind =
            row.node_type
                .parse()
                .map_err(|value| DeserializeError::UnknownNodeType {
                    id: row.constant_id.clone(),
                    value,
                })?;
        let plain = self
            .crypto
            .decrypt(&row.payload, self.key)
            .map_err(|source| DeserializeError::Decrypt {
                id: row.constant_id.clone(),
                source,
            })?;
        let payload: NodePayload =
            serde_json::from_str(&plain).map_err(|source| DeserializeError::Payload {
                id: row.constant_id.clone(),
                source,
            })?;

        let id = ConstantId::new(&row.constant_id);
        let mut node = match kind {
            RowKind::Root => {
                TreeNode::root(id, &row.name, payload.root.unwrap_or_else(RootNodeInfo::default))
            }
            RowKind::Container => {
                let mut node = TreeNode::container(id, &row.name);
                node.set_expanded(row.expanded);
                node
            }
            RowKind::Connection => TreeNode::connection(id, &row.name, ConnectionInfo::default()),
        };
        node.info = payload.info;
        node.favorite = row.favorite;
        node.please_connect = row.connected;

        Ok(DecodedRow {
            kind,
            parent: row.parent_id.clone().filter(|p| !p.trim().is_empty()),
            position: row.position,
            node,
        })
    }
}

impl std::fmt::Debug for TreeDeserializer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeDeserializer")
            .field("crypto", &self.crypto)
            .finish_non_exhaustive()
    }
}
