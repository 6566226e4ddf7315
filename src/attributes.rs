//! Attribute payload catalog (spec §6.2, C9): the decoded `AddNodes`
//! attribute payload, discriminated by node class, and the conversion into
//! a bare [`Node`].
//!
//! The real wire format tags each payload with a type pointer compared by
//! identity (`item->nodeAttributes.content.decoded.type != &UA_TYPES[...]`);
//! since this core does not itself decode the wire, we model the same
//! discrimination as a Rust enum matched against the requested
//! [`ua::NodeClass`] in [`create_node_from_attributes`].

use crate::{
    node::{
        MethodNode, Node, NodeBody, ObjectNode, ObjectTypeNode, ReferenceTypeNode, ValueSource,
        VariableNode, VariableTypeNode, ViewNode,
    },
    ua, Error, Result,
};
use crate::ua::StatusCode;

/// Fields shared by every node class (spec §3 "common header").
#[derive(Debug, Clone, Default)]
pub struct CommonAttributes {
    pub display_name: ua::LocalizedText,
    pub description: ua::LocalizedText,
    pub write_mask: u32,
}

/// Decoded `AddNodes` attribute payload, tagged by node class (spec §3).
#[derive(Debug, Clone)]
pub enum NodeAttributes {
    Object {
        common: CommonAttributes,
        event_notifier: u8,
    },
    Variable {
        common: CommonAttributes,
        data_type: ua::NodeId,
        value_rank: i32,
        array_dimensions: Vec<u32>,
        access_level: ua::AccessLevel,
        historizing: bool,
        minimum_sampling_interval: ua::Duration,
        value: Option<ua::Variant>,
    },
    Method {
        common: CommonAttributes,
        executable: bool,
    },
    ObjectType {
        common: CommonAttributes,
        is_abstract: bool,
    },
    VariableType {
        common: CommonAttributes,
        data_type: ua::NodeId,
        value_rank: i32,
        array_dimensions: Vec<u32>,
        is_abstract: bool,
        value: Option<ua::Variant>,
    },
    ReferenceType {
        common: CommonAttributes,
        is_abstract: bool,
        symmetric: bool,
        inverse_name: ua::LocalizedText,
    },
    DataType {
        common: CommonAttributes,
        is_abstract: bool,
    },
    View {
        common: CommonAttributes,
        contains_no_loops: bool,
        event_notifier: u8,
    },
}

impl NodeAttributes {
    #[must_use]
    pub const fn node_class(&self) -> ua::NodeClass {
        match self {
            Self::Object { .. } => ua::NodeClass::Object,
            Self::Variable { .. } => ua::NodeClass::Variable,
            Self::Method { .. } => ua::NodeClass::Method,
            Self::ObjectType { .. } => ua::NodeClass::ObjectType,
            Self::VariableType { .. } => ua::NodeClass::VariableType,
            Self::ReferenceType { .. } => ua::NodeClass::ReferenceType,
            Self::DataType { .. } => ua::NodeClass::DataType,
            Self::View { .. } => ua::NodeClass::View,
        }
    }

    const fn common(&self) -> &CommonAttributes {
        match self {
            Self::Object { common, .. }
            | Self::Variable { common, .. }
            | Self::Method { common, .. }
            | Self::ObjectType { common, .. }
            | Self::VariableType { common, .. }
            | Self::ReferenceType { common, .. }
            | Self::DataType { common, .. }
            | Self::View { common, .. } => common,
        }
    }
}

/// `createNodeFromAttributes`: builds a bare [`Node`] of `node_class` from
/// `attributes`, `requested_new_node_id` and `browse_name`.
///
/// A mismatch between `node_class` and the attribute payload's own variant
/// is `BadNodeAttributesInvalid`; this mirrors the `CHECK_ATTRIBUTES` macro
/// comparing the decoded extension object's type against the expected one
/// for the class named in the `AddNodesItem`.
pub fn create_node_from_attributes(
    node_class: ua::NodeClass,
    requested_new_node_id: ua::NodeId,
    browse_name: ua::QualifiedName,
    attributes: &NodeAttributes,
) -> Result<Node> {
    if attributes.node_class() != node_class {
        return Err(Error::new(StatusCode::BAD_NODE_ATTRIBUTES_INVALID));
    }

    let common = attributes.common();
    let mut node = Node::new(node_class);
    node.node_id = requested_new_node_id;
    node.browse_name = browse_name;
    node.display_name = common.display_name.clone();
    node.description = common.description.clone();
    node.write_mask = common.write_mask;

    match attributes {
        NodeAttributes::Object { event_notifier, .. } => {
            node.body = NodeBody::Object(ObjectNode {
                event_notifier: *event_notifier,
                instance_handle: None,
            });
        }
        NodeAttributes::Variable {
            data_type,
            value_rank,
            array_dimensions,
            access_level,
            historizing,
            minimum_sampling_interval,
            value,
            ..
        } => {
            node.body = NodeBody::Variable(VariableNode {
                data_type: data_type.clone(),
                value_rank: *value_rank,
                array_dimensions: array_dimensions.clone(),
                access_level: *access_level,
                historizing: *historizing,
                minimum_sampling_interval: *minimum_sampling_interval,
                value_source: value_source_from(value.clone()),
            });
        }
        NodeAttributes::Method { executable, .. } => {
            node.body = NodeBody::Method(MethodNode {
                executable: *executable,
                callback: None,
            });
        }
        NodeAttributes::ObjectType { is_abstract, .. } => {
            node.body = NodeBody::ObjectType(ObjectTypeNode {
                is_abstract: *is_abstract,
                lifecycle: crate::node::ObjectLifecycle::default(),
            });
        }
        NodeAttributes::VariableType {
            data_type,
            value_rank,
            array_dimensions,
            is_abstract,
            value,
            ..
        } => {
            node.body = NodeBody::VariableType(VariableTypeNode {
                is_abstract: *is_abstract,
                data_type: data_type.clone(),
                value_rank: *value_rank,
                array_dimensions: array_dimensions.clone(),
                value_source: value_source_from(value.clone()),
            });
        }
        NodeAttributes::ReferenceType {
            is_abstract,
            symmetric,
            inverse_name,
            ..
        } => {
            node.body = NodeBody::ReferenceType(ReferenceTypeNode {
                is_abstract: *is_abstract,
                symmetric: *symmetric,
                inverse_name: inverse_name.clone(),
            });
        }
        NodeAttributes::DataType { is_abstract, .. } => {
            node.body = NodeBody::DataType(crate::node::DataTypeNode {
                is_abstract: *is_abstract,
            });
        }
        NodeAttributes::View {
            contains_no_loops,
            event_notifier,
            ..
        } => {
            node.body = NodeBody::View(ViewNode {
                contains_no_loops: *contains_no_loops,
                event_notifier: *event_notifier,
            });
        }
    }

    Ok(node)
}

fn value_source_from(value: Option<ua::Variant>) -> ValueSource {
    ValueSource::Data {
        value: value.map_or_else(ua::DataValue::default, ua::DataValue::new),
        callback: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_attribute_variant_is_rejected() {
        let attrs = NodeAttributes::Variable {
            common: CommonAttributes::default(),
            data_type: ua::builtin::int32(),
            value_rank: -1,
            array_dimensions: Vec::new(),
            access_level: ua::AccessLevel::default(),
            historizing: false,
            minimum_sampling_interval: ua::Duration::default(),
            value: None,
        };
        let err = create_node_from_attributes(
            ua::NodeClass::Object,
            ua::NodeId::numeric(1, 0),
            ua::QualifiedName::new(1, "x"),
            &attrs,
        )
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_NODE_ATTRIBUTES_INVALID);
    }

    #[test]
    fn builds_variable_node() {
        let attrs = NodeAttributes::Variable {
            common: CommonAttributes::default(),
            data_type: ua::builtin::int32(),
            value_rank: -1,
            array_dimensions: Vec::new(),
            access_level: ua::AccessLevel::default(),
            historizing: false,
            minimum_sampling_interval: ua::Duration::default(),
            value: Some(ua::Variant::from(7_i32)),
        };
        let node = create_node_from_attributes(
            ua::NodeClass::Variable,
            ua::NodeId::numeric(1, 0),
            ua::QualifiedName::new(1, "v1"),
            &attrs,
        )
        .unwrap();
        assert_eq!(node.node_class(), ua::NodeClass::Variable);
        assert_eq!(node.variable().unwrap().data_type, ua::builtin::int32());
    }
}
