//! Type checker (spec §4.3, C3): validates and coerces a Variable or
//! VariableType node against its type definition before it is admitted into
//! the address space.

use crate::{
    node::{Node, NodeBody, ValueSource},
    reference::is_node_in_tree,
    store::NodeStore,
    ua, Error, Result,
};
use crate::ua::StatusCode;

/// `typeCheckVariableNode`: validates `node_id` (a Variable or VariableType)
/// against `type_def`, coercing its value and, if its rank is the wildcard
/// sentinel `0`, upgrading it to `-2` when the observed value is non-scalar.
pub fn type_check_variable_node(
    store: &NodeStore,
    node_id: &ua::NodeId,
    type_def: &ua::NodeId,
) -> Result<()> {
    // The bootstrap load defines BaseDataVariableType itself; it has no
    // type definition to check against.
    if *node_id == ua::builtin::base_data_variable_type() {
        return Ok(());
    }

    let type_node = store
        .get_copy(type_def)
        .ok_or_else(|| Error::new(StatusCode::BAD_TYPE_DEFINITION_INVALID))?;
    let Some((type_data_type, type_value_rank, type_array_dimensions)) = variable_shape(&type_node)
    else {
        return Err(Error::new(StatusCode::BAD_TYPE_DEFINITION_INVALID));
    };

    let node = store
        .get_copy(node_id)
        .ok_or_else(|| Error::new(StatusCode::BAD_NODE_ID_UNKNOWN))?;
    let instantiating_variable = node.node_class() == ua::NodeClass::Variable;
    if is_abstract_type(&type_node) && instantiating_variable {
        return Err(Error::new(StatusCode::BAD_TYPE_DEFINITION_INVALID));
    }

    let Some((node_data_type, node_value_rank, node_array_dimensions)) = variable_shape(&node)
    else {
        return Err(Error::new(StatusCode::BAD_NODE_CLASS_INVALID));
    };

    if !compatible_data_type(store, node_data_type, type_data_type) {
        return Err(Error::new(StatusCode::BAD_TYPE_MISMATCH));
    }

    let value = read_value(&node)?;
    let is_non_scalar = value.as_ref().is_some_and(|value| !value.is_scalar());
    let effective_dims = if node_array_dimensions.is_empty() && is_non_scalar {
        1
    } else {
        node_array_dimensions.len()
    };

    compatible_value_rank_array_dimensions(node_value_rank, effective_dims)?;
    compatible_value_ranks(node_value_rank, type_value_rank)?;
    compatible_array_dimensions(node_array_dimensions, type_array_dimensions)?;

    let upgraded_rank = (node_value_rank == 0 && is_non_scalar).then_some(-2);
    let coerced_value = value
        .as_ref()
        .and_then(|value| type_check_value(value, node_data_type));

    if upgraded_rank.is_some() || coerced_value.is_some() {
        store.edit(node_id, |node| {
            if let Some(rank) = upgraded_rank {
                write_value_rank(node, rank);
            }
            if let Some(coerced) = coerced_value {
                write_value(node, coerced);
            }
            Ok(())
        })?;
    }

    Ok(())
}

fn variable_shape(node: &Node) -> Option<(&ua::NodeId, i32, &[u32])> {
    match &node.body {
        NodeBody::Variable(variable) => Some((
            &variable.data_type,
            variable.value_rank,
            &variable.array_dimensions,
        )),
        NodeBody::VariableType(variable_type) => Some((
            &variable_type.data_type,
            variable_type.value_rank,
            &variable_type.array_dimensions,
        )),
        _ => None,
    }
}

fn is_abstract_type(node: &Node) -> bool {
    match &node.body {
        NodeBody::VariableType(variable_type) => variable_type.is_abstract,
        NodeBody::ObjectType(object_type) => object_type.is_abstract,
        NodeBody::ReferenceType(reference_type) => reference_type.is_abstract,
        NodeBody::DataType(data_type) => data_type.is_abstract,
        _ => false,
    }
}

fn read_value(node: &Node) -> Result<Option<ua::Variant>> {
    let value_source = match &node.body {
        NodeBody::Variable(variable) => &variable.value_source,
        NodeBody::VariableType(variable_type) => &variable_type.value_source,
        _ => return Ok(None),
    };
    match value_source {
        ValueSource::Data { value, .. } => Ok(value.value.clone()),
        ValueSource::DataSource(source) => Ok((source.read)(&node.node_id)?.value),
    }
}

fn write_value_rank(node: &mut Node, rank: i32) {
    match &mut node.body {
        NodeBody::Variable(variable) => variable.value_rank = rank,
        NodeBody::VariableType(variable_type) => variable_type.value_rank = rank,
        _ => {}
    }
}

fn write_value(node: &mut Node, value: ua::Variant) {
    let value_source = match &mut node.body {
        NodeBody::Variable(variable) => &mut variable.value_source,
        NodeBody::VariableType(variable_type) => &mut variable_type.value_source,
        _ => return,
    };
    if let ValueSource::Data { value: data_value, .. } = value_source {
        data_value.value = Some(value);
    }
}

/// `compatibleDataType`: the node's data type must be (a subtype of) the
/// type definition's data type.
fn compatible_data_type(store: &NodeStore, node_data_type: &ua::NodeId, type_data_type: &ua::NodeId) -> bool {
    node_data_type == type_data_type
        || is_node_in_tree(
            store,
            node_data_type,
            &[type_data_type.clone()],
            &[ua::builtin::has_subtype()],
        )
}

/// `compatibleValueRankArrayDimensions`: self-consistency between a node's
/// own `valueRank` and the number of dimensions it declares.
fn compatible_value_rank_array_dimensions(value_rank: i32, dims: usize) -> Result<()> {
    let compatible = match value_rank {
        -3 => true,
        -2 => dims <= 1,
        -1 => dims == 0,
        0 => dims >= 1,
        rank if rank >= 1 => dims == rank as usize,
        _ => true,
    };
    if compatible {
        Ok(())
    } else {
        Err(Error::new(StatusCode::BAD_TYPE_MISMATCH))
    }
}

/// `compatibleValueRanks`: a fixed type rank must be matched exactly;
/// wildcard ranks (negative, other than `-1`) widen to accept anything.
fn compatible_value_ranks(node_value_rank: i32, type_value_rank: i32) -> Result<()> {
    if type_value_rank >= 0 && node_value_rank != type_value_rank {
        Err(Error::new(StatusCode::BAD_TYPE_MISMATCH))
    } else {
        Ok(())
    }
}

/// `compatibleArrayDimensions`: where the type pins a dimension to a
/// non-zero value, the node must declare the same value; zero is a
/// wildcard.
fn compatible_array_dimensions(node_dims: &[u32], type_dims: &[u32]) -> Result<()> {
    if type_dims.is_empty() {
        return Ok(());
    }
    if node_dims.len() != type_dims.len() {
        return Err(Error::new(StatusCode::BAD_TYPE_MISMATCH));
    }
    let compatible = node_dims
        .iter()
        .zip(type_dims)
        .all(|(&node_dim, &type_dim)| type_dim == 0 || node_dim == type_dim);
    if compatible {
        Ok(())
    } else {
        Err(Error::new(StatusCode::BAD_TYPE_MISMATCH))
    }
}

/// `typeCheckValue`: coerces `value` into `target_data_type` where legal,
/// returning `None` when no change is needed or none is possible.
fn type_check_value(value: &ua::Variant, target_data_type: &ua::NodeId) -> Option<ua::Variant> {
    if value.data_type_id().as_ref() == Some(target_data_type) {
        return None;
    }
    match value {
        ua::Variant::Scalar(scalar) => scalar.coerce_numeric(target_data_type).map(ua::Variant::Scalar),
        ua::Variant::Array(elements) => elements
            .iter()
            .map(|scalar| scalar.coerce_numeric(target_data_type))
            .collect::<Option<Vec<_>>>()
            .map(ua::Variant::Array),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::VariableNode;

    fn variable_type_store() -> (NodeStore, ua::NodeId) {
        let store = NodeStore::new(1);
        let mut base = Node::new(ua::NodeClass::VariableType);
        base.node_id = ua::builtin::base_data_variable_type();
        if let NodeBody::VariableType(variable_type) = &mut base.body {
            variable_type.data_type = ua::builtin::int32();
            variable_type.value_rank = -1;
        }
        store.insert(base.clone()).unwrap();

        let mut int32_type = Node::new(ua::NodeClass::VariableType);
        int32_type.node_id = ua::NodeId::numeric(0, 9001);
        if let NodeBody::VariableType(variable_type) = &mut int32_type.body {
            variable_type.data_type = ua::builtin::int32();
            variable_type.value_rank = -1;
        }
        let id = store.insert(int32_type).unwrap();
        (store, id)
    }

    #[test]
    fn compatible_variable_passes() {
        let (store, type_id) = variable_type_store();
        let mut variable = Node::new(ua::NodeClass::Variable);
        variable.node_id = ua::NodeId::numeric(0, 1);
        if let NodeBody::Variable(v) = &mut variable.body {
            *v = VariableNode {
                data_type: ua::builtin::int32(),
                value_rank: -1,
                ..VariableNode::default()
            };
        }
        let id = store.insert(variable).unwrap();
        type_check_variable_node(&store, &id, &type_id).unwrap();
    }

    #[test]
    fn mismatched_rank_and_dimensions_rejected() {
        let (store, type_id) = variable_type_store();
        let mut variable = Node::new(ua::NodeClass::Variable);
        variable.node_id = ua::NodeId::numeric(0, 2);
        if let NodeBody::Variable(v) = &mut variable.body {
            *v = VariableNode {
                data_type: ua::builtin::int32(),
                value_rank: 1,
                array_dimensions: Vec::new(),
                value_source: ValueSource::Data {
                    value: ua::DataValue::new(ua::Variant::from(7_i32)),
                    callback: None,
                },
                ..VariableNode::default()
            };
        }
        let id = store.insert(variable).unwrap();
        let err = type_check_variable_node(&store, &id, &type_id).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_TYPE_MISMATCH);
    }

    #[test]
    fn data_type_mismatch_rejected() {
        let (store, type_id) = variable_type_store();
        let mut variable = Node::new(ua::NodeClass::Variable);
        variable.node_id = ua::NodeId::numeric(0, 3);
        if let NodeBody::Variable(v) = &mut variable.body {
            v.data_type = ua::builtin::string();
            v.value_rank = -1;
        }
        let id = store.insert(variable).unwrap();
        let err = type_check_variable_node(&store, &id, &type_id).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_TYPE_MISMATCH);
    }
}
