//! The node graph's data model (spec §3): a common header plus a
//! node-class-specific body, and the reference type that links nodes
//! together inside [`crate::store::NodeStore`].

use std::{any::Any, fmt, sync::Arc};

use derive_more::Debug;

use crate::ua;

/// Opaque per-object state produced by an [`ObjectLifecycle`] constructor and
/// handed back to its destructor. Mirrors `UA_ObjectNode::instanceHandle`,
/// which the original carries as a bare `void*`.
pub type InstanceHandle = Arc<dyn Any + Send + Sync>;

/// One entry in a node's reference sequence (spec §3 "Reference").
///
/// Every forward reference stored on a local source node has a matching
/// mirror on the target with `is_inverse` negated; see
/// [`crate::reference`] for the invariant-preserving operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub reference_type_id: ua::NodeId,
    pub target_id: ua::ExpandedNodeId,
    pub is_inverse: bool,
}

impl Reference {
    #[must_use]
    pub const fn new(
        reference_type_id: ua::NodeId,
        target_id: ua::ExpandedNodeId,
        is_inverse: bool,
    ) -> Self {
        Self {
            reference_type_id,
            target_id,
            is_inverse,
        }
    }
}

/// A node in the address space: common header plus a [`NodeBody`] variant.
#[derive(Debug, Clone)]
pub struct Node {
    pub node_id: ua::NodeId,
    pub browse_name: ua::QualifiedName,
    pub display_name: ua::LocalizedText,
    pub description: ua::LocalizedText,
    pub write_mask: u32,
    pub references: Vec<Reference>,
    pub body: NodeBody,
}

impl Node {
    /// Creates a bare node of the given class with a null id and empty
    /// attributes. Mirrors `UA_NodeStore_newNode`.
    #[must_use]
    pub fn new(node_class: ua::NodeClass) -> Self {
        let body = match node_class {
            ua::NodeClass::Object => NodeBody::Object(ObjectNode::default()),
            ua::NodeClass::Variable => NodeBody::Variable(VariableNode::default()),
            ua::NodeClass::Method => NodeBody::Method(MethodNode::default()),
            ua::NodeClass::ObjectType => NodeBody::ObjectType(ObjectTypeNode::default()),
            ua::NodeClass::VariableType => NodeBody::VariableType(VariableTypeNode::default()),
            ua::NodeClass::ReferenceType => NodeBody::ReferenceType(ReferenceTypeNode::default()),
            ua::NodeClass::DataType => NodeBody::DataType(DataTypeNode::default()),
            ua::NodeClass::View => NodeBody::View(ViewNode::default()),
        };
        Self {
            node_id: ua::NodeId::null(),
            browse_name: ua::QualifiedName::new(0, String::new()),
            display_name: ua::LocalizedText::default(),
            description: ua::LocalizedText::default(),
            write_mask: 0,
            references: Vec::new(),
            body,
        }
    }

    #[must_use]
    pub const fn node_class(&self) -> ua::NodeClass {
        self.body.node_class()
    }

    #[must_use]
    pub fn variable(&self) -> Option<&VariableNode> {
        match &self.body {
            NodeBody::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    #[must_use]
    pub fn variable_mut(&mut self) -> Option<&mut VariableNode> {
        match &mut self.body {
            NodeBody::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    #[must_use]
    pub fn object(&self) -> Option<&ObjectNode> {
        match &self.body {
            NodeBody::Object(object) => Some(object),
            _ => None,
        }
    }

    #[must_use]
    pub fn object_mut(&mut self) -> Option<&mut ObjectNode> {
        match &mut self.body {
            NodeBody::Object(object) => Some(object),
            _ => None,
        }
    }
}

/// Node-class-specific attributes, mirroring the tagged-union cast from
/// `UA_Node` to `UA_VariableNode`/`UA_ObjectNode`/... in the original.
#[derive(Debug, Clone)]
pub enum NodeBody {
    Object(ObjectNode),
    Variable(VariableNode),
    Method(MethodNode),
    ObjectType(ObjectTypeNode),
    VariableType(VariableTypeNode),
    ReferenceType(ReferenceTypeNode),
    DataType(DataTypeNode),
    View(ViewNode),
}

impl NodeBody {
    #[must_use]
    pub const fn node_class(&self) -> ua::NodeClass {
        match self {
            Self::Object(_) => ua::NodeClass::Object,
            Self::Variable(_) => ua::NodeClass::Variable,
            Self::Method(_) => ua::NodeClass::Method,
            Self::ObjectType(_) => ua::NodeClass::ObjectType,
            Self::VariableType(_) => ua::NodeClass::VariableType,
            Self::ReferenceType(_) => ua::NodeClass::ReferenceType,
            Self::DataType(_) => ua::NodeClass::DataType,
            Self::View(_) => ua::NodeClass::View,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectNode {
    pub event_notifier: u8,
    pub instance_handle: Option<InstanceHandle>,
}

/// Where a variable's current value comes from. Mirrors `UA_ValueSource`
/// together with the `UA_NodeValue` union it tags.
#[derive(Clone)]
pub enum ValueSource {
    Data {
        value: ua::DataValue,
        callback: Option<ValueCallback>,
    },
    DataSource(DataSource),
}

impl Default for ValueSource {
    fn default() -> Self {
        Self::Data {
            value: ua::DataValue::default(),
            callback: None,
        }
    }
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data { value, callback } => f
                .debug_struct("Data")
                .field("value", value)
                .field("callback", &callback.is_some())
                .finish(),
            Self::DataSource(_) => f.write_str("DataSource(..)"),
        }
    }
}

/// `{onRead, onWrite}` hooks invoked around reads/writes of a value held
/// directly on the node (spec §6 "Callback surfaces exposed").
#[derive(Debug, Clone)]
pub struct ValueCallback {
    #[debug("{}", on_read.is_some())]
    pub on_read: Option<Arc<dyn Fn(&ua::NodeId) + Send + Sync>>,
    #[debug("{}", on_write.is_some())]
    pub on_write: Option<Arc<dyn Fn(&ua::NodeId, &ua::DataValue) + Send + Sync>>,
}

/// A variable whose value is computed on demand rather than stored.
///
/// Context is captured by the closures themselves rather than threaded
/// through as an opaque pointer, unlike `UA_DataSource`'s `void *handle`.
#[derive(Clone)]
pub struct DataSource {
    pub read: Arc<dyn Fn(&ua::NodeId) -> crate::Result<ua::DataValue> + Send + Sync>,
    pub write: Arc<dyn Fn(&ua::NodeId, ua::DataValue) -> crate::Result<()> + Send + Sync>,
}

#[derive(Debug, Clone, Default)]
pub struct VariableNode {
    pub data_type: ua::NodeId,
    pub value_rank: i32,
    pub array_dimensions: Vec<u32>,
    pub access_level: ua::AccessLevel,
    pub historizing: bool,
    pub minimum_sampling_interval: ua::Duration,
    pub value_source: ValueSource,
}

#[derive(Debug, Clone, Default)]
pub struct VariableTypeNode {
    pub is_abstract: bool,
    pub data_type: ua::NodeId,
    pub value_rank: i32,
    pub array_dimensions: Vec<u32>,
    pub value_source: ValueSource,
}

/// Context passed back into a [`MethodCallback`]; opaque to the core.
pub type MethodContext = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone)]
pub struct MethodCallback {
    #[debug(skip)]
    pub handler: Arc<
        dyn Fn(&ua::NodeId, Option<&MethodContext>, &[ua::Variant]) -> (Vec<ua::Variant>, ua::StatusCode)
            + Send
            + Sync,
    >,
    #[debug("{}", context.is_some())]
    pub context: Option<MethodContext>,
}

#[derive(Debug, Clone, Default)]
pub struct MethodNode {
    pub executable: bool,
    pub callback: Option<MethodCallback>,
}

/// Constructor/destructor pair invoked during instantiation and deletion of
/// objects of this type (spec §3 "lifecycleManagement").
#[derive(Debug, Clone, Default)]
pub struct ObjectLifecycle {
    #[debug("{}", constructor.is_some())]
    pub constructor: Option<Arc<dyn Fn(&ua::NodeId) -> InstanceHandle + Send + Sync>>,
    #[debug("{}", destructor.is_some())]
    pub destructor: Option<Arc<dyn Fn(&ua::NodeId, Option<&InstanceHandle>) + Send + Sync>>,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectTypeNode {
    pub is_abstract: bool,
    pub lifecycle: ObjectLifecycle,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTypeNode {
    pub is_abstract: bool,
    pub symmetric: bool,
    pub inverse_name: ua::LocalizedText,
}

#[derive(Debug, Clone, Default)]
pub struct DataTypeNode {
    pub is_abstract: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ViewNode {
    pub contains_no_loops: bool,
    pub event_notifier: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_matches_requested_class() {
        assert_eq!(
            Node::new(ua::NodeClass::Variable).node_class(),
            ua::NodeClass::Variable
        );
        assert!(matches!(
            Node::new(ua::NodeClass::Object).body,
            NodeBody::Object(_)
        ));
    }
}
