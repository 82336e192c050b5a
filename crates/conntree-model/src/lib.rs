//! Connection tree model
//!
//! In-memory representation of a connection collection:
//!
//! ```text
//! Root (Connection)
//! ├── Container "Production"
//! │   ├── Connection "db-01"
//! │   └── Connection "web-01"
//! └── Connection "jumpbox"
//! ```
//!
//! Every node carries a [`ConstantId`] assigned by the store. Identities are
//! unique across the tree and never change, which is what lets per-user
//! overlay records and cache copies find "the same" node again.
//!
//! # Example
//!
//! ```
//! use conntree_model::{ConnectionInfo, ConnectionTree, RootNodeInfo};
//!
//! let mut tree = ConnectionTree::new(RootNodeInfo::default());
//! let root = tree.root_id().clone();
//! let prod = tree.add_container(&root, "Production").unwrap();
//! tree.add_connection(&prod, "db-01", ConnectionInfo::default()).unwrap();
//!
//! assert_eq!(tree.len(), 3);
//! assert_eq!(tree.descendants(&root).len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod id;
pub mod node;
pub mod tree;

pub use error::TreeError;
pub use id::ConstantId;
pub use node::{ConnectionInfo, NodeKind, Protocol, RootNodeInfo, RootNodeType, TreeNode};
pub use tree::ConnectionTree;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
