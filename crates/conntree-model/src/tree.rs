//! The connection tree
//!
//! Nodes live in an insertion-ordered map keyed by [`ConstantId`]; parent and
//! child links are identities, not references. The tree always holds exactly
//! one root, and every other node is reachable from it.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::id::ConstantId;
use crate::node::{ConnectionInfo, RootNodeInfo, TreeNode};

/// Rooted tree of containers and connections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TreeRepr")]
pub struct ConnectionTree {
    root: ConstantId,
    nodes: IndexMap<ConstantId, TreeNode>,
}

#[derive(Deserialize)]
struct TreeRepr {
    root: ConstantId,
    nodes: IndexMap<ConstantId, TreeNode>,
}

impl TryFrom<TreeRepr> for ConnectionTree {
    type Error = TreeError;

    fn try_from(repr: TreeRepr) -> Result<Self, Self::Error> {
        let tree = Self {
            root: repr.root,
            nodes: repr.nodes,
        };
        tree.validate()?;
        Ok(tree)
    }
}

impl ConnectionTree {
    /// Create a tree holding only a fresh root
    #[must_use]
    pub fn new(info: RootNodeInfo) -> Self {
        let root = TreeNode::root(ConstantId::generate(), RootNodeInfo::DEFAULT_NAME, info);
        Self::from_root(root)
    }

    /// Create a tree around an existing root node
    ///
    /// # Errors
    /// Returns [`TreeError::MissingRoot`] if `root` is not a root node
    pub fn with_root(root: TreeNode) -> Result<Self, TreeError> {
        if !root.is_root() {
            return Err(TreeError::MissingRoot);
        }
        Ok(Self::from_root(root))
    }

    fn from_root(mut root: TreeNode) -> Self {
        root.detach();
        let id = root.id().clone();
        let mut nodes = IndexMap::new();
        nodes.insert(id.clone(), root);
        Self { root: id, nodes }
    }

    /// Identity of the root node
    #[inline]
    #[must_use]
    pub fn root_id(&self) -> &ConstantId {
        &self.root
    }

    /// The root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> &TreeNode {
        &self.nodes[&self.root]
    }

    /// Mutable root node
    #[inline]
    pub fn root_mut(&mut self) -> &mut TreeNode {
        &mut self.nodes[&self.root]
    }

    /// Look up a node
    #[inline]
    #[must_use]
    pub fn get(&self, id: &ConstantId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    /// Look up a node mutably
    #[inline]
    pub fn get_mut(&mut self, id: &ConstantId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(id)
    }

    /// True if a node with this identity exists
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &ConstantId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes, root included
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree holds at least its root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order (root first)
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.values()
    }

    /// All nodes, mutably, in insertion order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TreeNode> {
        self.nodes.values_mut()
    }

    /// Attach `node` as the last child of `parent`
    ///
    /// Any parent/child links already on `node` are discarded.
    ///
    /// # Errors
    /// - [`TreeError::UnexpectedRoot`] if `node` is a root
    /// - [`TreeError::DuplicateId`] if the identity is taken
    /// - [`TreeError::NodeNotFound`] if `parent` does not exist
    /// - [`TreeError::ParentNotContainer`] if `parent` is a connection
    pub fn insert(&mut self, parent: &ConstantId, mut node: TreeNode) -> Result<(), TreeError> {
        if node.is_root() {
            return Err(TreeError::UnexpectedRoot(node.id().clone()));
        }
        if self.nodes.contains_key(node.id()) {
            return Err(TreeError::DuplicateId(node.id().clone()));
        }
        let parent_node = self
            .nodes
            .get_mut(parent)
            .ok_or_else(|| TreeError::NodeNotFound(parent.clone()))?;
        if !parent_node.can_have_children() {
            return Err(TreeError::ParentNotContainer(parent.clone()));
        }

        node.detach();
        node.set_parent(Some(parent.clone()));
        let id = node.id().clone();
        parent_node.push_child(id.clone());
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Add a new collapsed container with a generated identity
    ///
    /// # Errors
    /// Same as [`ConnectionTree::insert`]
    pub fn add_container(
        &mut self,
        parent: &ConstantId,
        name: impl Into<String>,
    ) -> Result<ConstantId, TreeError> {
        let id = ConstantId::generate();
        self.insert(parent, TreeNode::container(id.clone(), name))?;
        Ok(id)
    }

    /// Add a new connection with a generated identity
    ///
    /// # Errors
    /// Same as [`ConnectionTree::insert`]
    pub fn add_connection(
        &mut self,
        parent: &ConstantId,
        name: impl Into<String>,
        info: ConnectionInfo,
    ) -> Result<ConstantId, TreeError> {
        let id = ConstantId::generate();
        self.insert(parent, TreeNode::connection(id.clone(), name, info))?;
        Ok(id)
    }

    /// Direct children of a node, in display order
    pub fn children<'a>(&'a self, id: &ConstantId) -> impl Iterator<Item = &'a TreeNode> + 'a {
        self.nodes
            .get(id)
            .map(TreeNode::children)
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.nodes.get(child))
    }

    /// Every node below `id`, depth first, in display order
    ///
    /// The node itself is not included. Unknown identities yield nothing.
    #[must_use]
    pub fn descendants(&self, id: &ConstantId) -> Vec<ConstantId> {
        let mut out = Vec::new();
        let mut stack: Vec<&ConstantId> = match self.nodes.get(id) {
            Some(node) => node.children().iter().rev().collect(),
            None => return out,
        };
        while let Some(current) = stack.pop() {
            out.push(current.clone());
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children().iter().rev());
            }
        }
        out
    }

    /// Check every structural invariant
    ///
    /// # Errors
    /// The first violation found
    pub fn validate(&self) -> Result<(), TreeError> {
        let root = self.nodes.get(&self.root).ok_or(TreeError::MissingRoot)?;
        if !root.is_root() {
            return Err(TreeError::MissingRoot);
        }
        if root.parent().is_some() {
            return Err(TreeError::InconsistentLink(self.root.clone()));
        }

        for (key, node) in &self.nodes {
            if key != node.id() {
                return Err(TreeError::InconsistentLink(key.clone()));
            }
            if key != &self.root {
                if node.is_root() {
                    return Err(TreeError::UnexpectedRoot(key.clone()));
                }
                let parent_id = node
                    .parent()
                    .ok_or_else(|| TreeError::InconsistentLink(key.clone()))?;
                let parent = self
                    .nodes
                    .get(parent_id)
                    .ok_or_else(|| TreeError::NodeNotFound(parent_id.clone()))?;
                if !parent.children().contains(key) {
                    return Err(TreeError::InconsistentLink(key.clone()));
                }
            }
            if !node.can_have_children() && !node.children().is_empty() {
                return Err(TreeError::ParentNotContainer(key.clone()));
            }
            for child in node.children() {
                let child_node = self
                    .nodes
                    .get(child)
                    .ok_or_else(|| TreeError::NodeNotFound(child.clone()))?;
                if child_node.parent() != Some(key) {
                    return Err(TreeError::InconsistentLink(child.clone()));
                }
            }
        }

        // Each node has one parent that lists it, so anything unreachable
        // from the root sits on a cycle.
        let mut seen = HashSet::with_capacity(self.nodes.len());
        let mut stack = vec![&self.root];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                return Err(TreeError::InconsistentLink(current.clone()));
            }
            stack.extend(self.nodes[current].children());
        }
        if let Some(orphan) = self.nodes.keys().find(|id| !seen.contains(id)) {
            return Err(TreeError::Unreachable(orphan.clone()));
        }
        Ok(())
    }
}

impl TreeNode {
    fn detach(&mut self) {
        self.set_parent(None);
        self.clear_children();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use pretty_assertions::assert_eq;

    fn sample() -> (ConnectionTree, ConstantId, ConstantId) {
        let mut tree = ConnectionTree::new(RootNodeInfo::default());
        let root = tree.root_id().clone();
        let group = tree.add_container(&root, "group").unwrap();
        let host = tree
            .add_connection(&group, "host", ConnectionInfo::default())
            .unwrap();
        (tree, group, host)
    }

    #[test]
    fn new_tree_has_only_root() {
        let tree = ConnectionTree::new(RootNodeInfo::default());
        assert_eq!(tree.len(), 1);
        assert!(tree.root().is_root());
        assert_eq!(tree.root().name, RootNodeInfo::DEFAULT_NAME);
        tree.validate().unwrap();
    }

    #[test]
    fn insert_links_parent_and_child() {
        let (tree, group, host) = sample();
        assert_eq!(tree.get(&host).unwrap().parent(), Some(&group));
        assert_eq!(tree.get(&group).unwrap().children(), &[host.clone()]);
        assert_eq!(tree.descendants(tree.root_id()), vec![group, host]);
        tree.validate().unwrap();
    }

    #[test]
    fn insert_rejects_duplicate_identity() {
        let (mut tree, group, host) = sample();
        let dup = TreeNode::container(host.clone(), "dup");
        assert_eq!(tree.insert(&group, dup), Err(TreeError::DuplicateId(host)));
    }

    #[test]
    fn insert_rejects_connection_parent() {
        let (mut tree, _, host) = sample();
        let child = TreeNode::container(ConstantId::from("c"), "c");
        assert_eq!(tree.insert(&host, child), Err(TreeError::ParentNotContainer(host)));
    }

    #[test]
    fn insert_rejects_second_root() {
        let (mut tree, group, _) = sample();
        let extra = TreeNode::root(ConstantId::from("r2"), "r2", RootNodeInfo::default());
        assert_eq!(
            tree.insert(&group, extra),
            Err(TreeError::UnexpectedRoot(ConstantId::from("r2")))
        );
    }

    #[test]
    fn insert_rejects_unknown_parent() {
        let (mut tree, _, _) = sample();
        let node = TreeNode::container(ConstantId::from("c"), "c");
        assert_eq!(
            tree.insert(&ConstantId::from("nope"), node),
            Err(TreeError::NodeNotFound(ConstantId::from("nope")))
        );
    }

    #[test]
    fn with_root_requires_root_kind() {
        let node = TreeNode::container(ConstantId::from("c"), "c");
        assert_eq!(ConnectionTree::with_root(node), Err(TreeError::MissingRoot));
    }

    #[test]
    fn descendants_are_depth_first_in_order() {
        let mut tree = ConnectionTree::new(RootNodeInfo::default());
        let root = tree.root_id().clone();
        let a = tree.add_container(&root, "a").unwrap();
        let a1 = tree.add_connection(&a, "a1", ConnectionInfo::default()).unwrap();
        let b = tree.add_connection(&root, "b", ConnectionInfo::default()).unwrap();
        let a2 = tree.add_connection(&a, "a2", ConnectionInfo::default()).unwrap();

        assert_eq!(tree.descendants(&root), vec![a.clone(), a1, a2, b]);
        assert!(tree.descendants(&ConstantId::from("missing")).is_empty());
        assert_eq!(tree.children(&root).count(), 2);
    }

    #[test]
    fn deserializing_validates_structure() {
        let (tree, _, host) = sample();
        let mut json = serde_json::to_value(&tree).unwrap();
        json["nodes"][host.as_str()]["parent"] = serde_json::Value::Null;

        let err = serde_json::from_value::<ConnectionTree>(json).unwrap_err();
        assert!(err.to_string().contains("inconsistent parent link"));
    }

    #[test]
    fn serde_preserves_kind_and_flags() {
        let (mut tree, group, host) = sample();
        tree.get_mut(&group).unwrap().set_expanded(true);
        tree.get_mut(&host).unwrap().favorite = true;

        let json = serde_json::to_string(&tree).unwrap();
        let back: ConnectionTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
        assert_eq!(
            back.get(&group).unwrap().kind(),
            &NodeKind::Container { expanded: true }
        );
    }
}
