use std::fmt;

/// Discriminant and payload of a [`NodeId`], mirroring `UA_NodeIdType`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Identifier {
    Numeric(u32),
    String(String),
    #[cfg(feature = "uuid")]
    Guid(uuid::Uuid),
    Opaque(Vec<u8>),
}

/// Node identifier, unique within its namespace.
///
/// A numeric identifier of `0` is reserved as the "null" node id and is used
/// throughout the node-management service as the "unset" sentinel (e.g. a
/// null `typeDefinition` in an `AddNodes` request, or a null `parentNodeId`
/// for an object with no parent).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId {
    pub namespace_index: u16,
    pub identifier: Identifier,
}

impl NodeId {
    #[must_use]
    pub const fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: Identifier::Numeric(value),
        }
    }

    /// Creates a numeric node id in namespace 0, the standard namespace.
    #[must_use]
    pub const fn ns0(value: u32) -> Self {
        Self::numeric(0, value)
    }

    #[must_use]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: Identifier::String(value.into()),
        }
    }

    #[cfg(feature = "uuid")]
    #[must_use]
    pub const fn guid(namespace_index: u16, value: uuid::Uuid) -> Self {
        Self {
            namespace_index,
            identifier: Identifier::Guid(value),
        }
    }

    #[must_use]
    pub fn opaque(namespace_index: u16, value: impl Into<Vec<u8>>) -> Self {
        Self {
            namespace_index,
            identifier: Identifier::Opaque(value.into()),
        }
    }

    /// Returns the null node id, used as the "unset" sentinel.
    #[must_use]
    pub const fn null() -> Self {
        Self::numeric(0, 0)
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(
            self,
            Self {
                namespace_index: 0,
                identifier: Identifier::Numeric(0),
            }
        )
    }

    /// Whether this id's identifier is the numeric "allocate a new id"
    /// sentinel, independent of namespace (spec §3 invariant 1).
    #[must_use]
    pub const fn has_null_identifier(&self) -> bool {
        matches!(self.identifier, Identifier::Numeric(0))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            Identifier::Numeric(value) => write!(f, "ns={};i={value}", self.namespace_index),
            Identifier::String(value) => write!(f, "ns={};s={value}", self.namespace_index),
            #[cfg(feature = "uuid")]
            Identifier::Guid(value) => write!(f, "ns={};g={value}", self.namespace_index),
            Identifier::Opaque(value) => {
                write!(f, "ns={};b={}", self.namespace_index, hex(value))
            }
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// A [`NodeId`] together with an optional server/namespace indirection.
///
/// Used for reference targets, which may point across server/namespace
/// boundaries (`serverIndex != 0`); this core only ever resolves targets with
/// `server_index == 0` locally, and treats anything else as external.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpandedNodeId {
    node_id: Option<NodeId>,
    pub namespace_uri: Option<String>,
    pub server_index: u32,
}

impl ExpandedNodeId {
    #[must_use]
    pub const fn local(node_id: NodeId) -> Self {
        Self {
            node_id: Some(node_id),
            namespace_uri: None,
            server_index: 0,
        }
    }

    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.server_index == 0
    }

    #[must_use]
    pub const fn node_id(&self) -> Option<&NodeId> {
        self.node_id.as_ref()
    }

    #[must_use]
    pub fn into_node_id(self) -> Option<NodeId> {
        self.node_id
    }
}

impl From<NodeId> for ExpandedNodeId {
    fn from(node_id: NodeId) -> Self {
        Self::local(node_id)
    }
}
