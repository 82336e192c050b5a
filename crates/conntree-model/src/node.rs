//! Tree node types
//!
//! A [`TreeNode`] is one of three kinds:
//! - **Root**: the single top-level node, describing the collection itself
//! - **Container**: groups children, remembers whether it is expanded
//! - **Connection**: a leaf describing how to reach one host

use serde::{Deserialize, Serialize};

use crate::id::ConstantId;

/// What the root node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RootNodeType {
    /// Regular connection collection
    #[default]
    Connection,
    /// Sessions imported from PuTTY
    PuttySessions,
}

/// Root-specific properties
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RootNodeInfo {
    /// Root flavour
    pub root_type: RootNodeType,
    /// Whether the collection is protected by a user password
    #[serde(default)]
    pub password_protected: bool,
}

impl RootNodeInfo {
    /// Password used to protect collections that have no user password
    pub const DEFAULT_PASSWORD: &'static str = "mR3m";

    /// Display name given to a fresh root
    pub const DEFAULT_NAME: &'static str = "Connections";

    /// Create root info of the given type
    #[inline]
    #[must_use]
    pub fn new(root_type: RootNodeType) -> Self {
        Self {
            root_type,
            password_protected: false,
        }
    }

    /// Default password for this root
    #[inline]
    #[must_use]
    pub fn default_password(&self) -> &'static str {
        Self::DEFAULT_PASSWORD
    }
}

/// Remote access protocol of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Remote Desktop
    #[default]
    Rdp,
    /// Secure shell
    Ssh2,
    /// VNC remote framebuffer
    Vnc,
    /// Telnet
    Telnet,
    /// Rlogin
    Rlogin,
    /// Raw socket
    Raw,
    /// Plain HTTP
    Http,
    /// HTTP over TLS
    Https,
}

impl Protocol {
    /// Well-known port for the protocol
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Rdp => 3389,
            Self::Ssh2 => 22,
            Self::Vnc => 5900,
            Self::Telnet => 23,
            Self::Rlogin => 513,
            Self::Raw => 0,
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

/// Connection properties shared by every node
///
/// Containers carry them too so children can inherit values; only
/// connections actually use them to connect.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionInfo {
    /// Free-form description
    pub description: String,
    /// Host name or address
    pub hostname: String,
    /// Port, `None` for the protocol default
    pub port: Option<u16>,
    /// Access protocol
    pub protocol: Protocol,
    /// Login name
    pub username: String,
    /// Login domain
    pub domain: String,
    /// Login password
    pub password: Option<String>,
}

impl ConnectionInfo {
    /// Effective port (explicit or protocol default)
    #[inline]
    #[must_use]
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }
}

/// Node kind with kind-specific state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// Top-level node of the tree
    Root(RootNodeInfo),
    /// Groups children
    Container {
        /// Whether the container is shown expanded
        expanded: bool,
    },
    /// Leaf connection
    Connection,
}

/// A node of the connection tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    id: ConstantId,
    /// Display name
    pub name: String,
    kind: NodeKind,
    #[serde(default)]
    parent: Option<ConstantId>,
    #[serde(default)]
    children: Vec<ConstantId>,
    /// Connection properties
    #[serde(default)]
    pub info: ConnectionInfo,
    /// Connect automatically on startup
    #[serde(default)]
    pub please_connect: bool,
    /// Listed among favorites
    #[serde(default)]
    pub favorite: bool,
}

impl TreeNode {
    fn with_kind(id: ConstantId, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            parent: None,
            children: Vec::new(),
            info: ConnectionInfo::default(),
            please_connect: false,
            favorite: false,
        }
    }

    /// Create a root node
    #[must_use]
    pub fn root(id: ConstantId, name: impl Into<String>, info: RootNodeInfo) -> Self {
        Self::with_kind(id, name, NodeKind::Root(info))
    }

    /// Create a collapsed container
    #[must_use]
    pub fn container(id: ConstantId, name: impl Into<String>) -> Self {
        Self::with_kind(id, name, NodeKind::Container { expanded: false })
    }

    /// Create a connection
    #[must_use]
    pub fn connection(id: ConstantId, name: impl Into<String>, info: ConnectionInfo) -> Self {
        let mut node = Self::with_kind(id, name, NodeKind::Connection);
        node.info = info;
        node
    }

    /// Node identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ConstantId {
        &self.id
    }

    /// Node kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Parent identity, `None` for the root
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&ConstantId> {
        self.parent.as_ref()
    }

    /// Child identities in display order
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[ConstantId] {
        &self.children
    }

    /// True for the root node
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root(_))
    }

    /// True for container nodes (not the root)
    #[inline]
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container { .. })
    }

    /// True if the node may hold children
    #[inline]
    #[must_use]
    pub fn can_have_children(&self) -> bool {
        !matches!(self.kind, NodeKind::Connection)
    }

    /// Root properties, if this is the root
    #[inline]
    #[must_use]
    pub fn root_info(&self) -> Option<&RootNodeInfo> {
        match &self.kind {
            NodeKind::Root(info) => Some(info),
            _ => None,
        }
    }

    /// Expanded state, `None` unless this is a container
    #[inline]
    #[must_use]
    pub fn is_expanded(&self) -> Option<bool> {
        match self.kind {
            NodeKind::Container { expanded } => Some(expanded),
            _ => None,
        }
    }

    /// Set the expanded state
    ///
    /// Returns `false` and changes nothing if the node is not a container.
    pub fn set_expanded(&mut self, value: bool) -> bool {
        match &mut self.kind {
            NodeKind::Container { expanded } => {
                *expanded = value;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ConstantId>) {
        self.parent = parent;
    }

    pub(crate) fn push_child(&mut self, child: ConstantId) {
        self.children.push(child);
    }

    pub(crate) fn clear_children(&mut self) {
        self.children.clear();
    }
}
