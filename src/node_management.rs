//! NodeManagement service (spec §4.5, C5): two-phase `AddNode`, type
//! instantiation, `DeleteNode`, and the editor-callback setters that are the
//! only mutation path into a node once it is alive.

use std::sync::Arc;

use crate::{
    attributes::{create_node_from_attributes, NodeAttributes},
    browse::{try_browse_single, BrowseDescription, ReferenceDescription},
    node::{InstanceHandle, MethodCallback, Node, NodeBody, ObjectLifecycle, ValueCallback},
    reference::{
        service_add_references_single, service_delete_references_single, AddReferencesItem,
    },
    store::NodeStore,
    type_check::type_check_variable_node,
    ua, Error, Result,
};
use crate::ua::StatusCode;

/// Invoked once a node has been fully instantiated (spec §6 "instantiation
/// callback"): `(newNodeId, typeId, userHandle) -> ()`.
pub type InstantiationCallback = Arc<dyn Fn(&ua::NodeId, &ua::NodeId) + Send + Sync>;

/// A single `AddNodes` service item (spec §6).
#[derive(Debug, Clone)]
pub struct AddNodesItem {
    pub parent_node_id: ua::NodeId,
    pub reference_type_id: ua::NodeId,
    pub requested_new_node_id: ua::NodeId,
    pub browse_name: ua::QualifiedName,
    pub node_class: ua::NodeClass,
    pub node_attributes: NodeAttributes,
    pub type_definition: ua::NodeId,
}

/// A single `DeleteNodes` service item (spec §6).
#[derive(Debug, Clone)]
pub struct DeleteNodesItem {
    pub node_id: ua::NodeId,
    pub delete_target_references: bool,
}

/// `Service_AddNode_begin`: validates the namespace index, builds the node
/// from its attribute payload, and inserts it (allocating an id if the
/// requested one is null).
pub fn service_add_node_begin(store: &NodeStore, item: &AddNodesItem) -> Result<ua::NodeId> {
    log::debug!("Processing AddNodesItem for {}", item.browse_name);

    if let Some(handler) = store.namespace_handler(item.requested_new_node_id.namespace_index) {
        if let Some(result) = handler.add_node(item) {
            return result;
        }
    }

    if !store.is_valid_namespace(item.requested_new_node_id.namespace_index) {
        log::info!("AddNodes: Namespace invalid");
        return Err(Error::new(StatusCode::BAD_NODE_ID_INVALID));
    }

    let node = create_node_from_attributes(
        item.node_class,
        item.requested_new_node_id.clone(),
        item.browse_name.clone(),
        &item.node_attributes,
    )
    .inspect_err(|err| log::info!("AddNodes: Node attributes invalid: {err}"))?;

    store.insert(node)
}

/// `Service_AddNode_finish`: validates parent/type references, runs
/// type-checking for variables, links the parent reference and
/// instantiates the node. On any failure the node is deleted (with its
/// references) using the admin path, regardless of who requested it.
pub fn service_add_node_finish(
    store: &NodeStore,
    node_id: &ua::NodeId,
    parent_node_id: &ua::NodeId,
    reference_type_id: &ua::NodeId,
    type_definition: &ua::NodeId,
    instantiation_callback: Option<&InstantiationCallback>,
) -> Result<()> {
    let result = finish_inner(
        store,
        node_id,
        parent_node_id,
        reference_type_id,
        type_definition,
        instantiation_callback,
    );
    if let Err(err) = result {
        log::info!("AddNodes: finishing {node_id} failed: {err}");
        let _: Result<()> = service_delete_nodes_single(store, node_id, true);
        return Err(err);
    }
    Ok(())
}

fn finish_inner(
    store: &NodeStore,
    node_id: &ua::NodeId,
    parent_node_id: &ua::NodeId,
    reference_type_id: &ua::NodeId,
    type_definition: &ua::NodeId,
    instantiation_callback: Option<&InstantiationCallback>,
) -> Result<()> {
    let node_class = store
        .with_node(node_id, Node::node_class)
        .ok_or_else(|| Error::new(StatusCode::BAD_NODE_ID_UNKNOWN))?;

    let (mut parent_node_id, mut reference_type_id, mut type_definition) = (
        parent_node_id.clone(),
        reference_type_id.clone(),
        type_definition.clone(),
    );

    // Type-category nodes are reinterpreted: the "parent" is really their
    // supertype, linked by HasSubtype.
    if node_class.is_type() {
        reference_type_id = ua::builtin::has_subtype();
        type_definition = parent_node_id.clone();
    }

    if matches!(node_class, ua::NodeClass::Variable | ua::NodeClass::Object)
        && type_definition.is_null()
    {
        type_definition = if node_class == ua::NodeClass::Variable {
            ua::builtin::base_data_variable_type()
        } else {
            ua::builtin::base_object_type()
        };
    }

    // Objects may have no parent; every other class must have one.
    if node_class != ua::NodeClass::Object
        || !parent_node_id.is_null()
        || !reference_type_id.is_null()
    {
        check_parent_reference(store, node_class, &parent_node_id, &reference_type_id)?;
    }

    if matches!(
        node_class,
        ua::NodeClass::Variable | ua::NodeClass::VariableType
    ) {
        type_check_variable_node(store, node_id, &type_definition)?;
    }

    if !parent_node_id.is_null() {
        service_add_references_single(
            store,
            &AddReferencesItem {
                source_node_id: node_id.clone(),
                reference_type_id: reference_type_id.clone(),
                is_forward: false,
                target_node_id: parent_node_id.clone().into(),
            },
        )?;
    }

    instantiate_node(store, node_id, node_class, &type_definition, instantiation_callback)
}

/// `checkParentReference`: the parent must exist, the reference type must
/// exist, be a non-abstract `ReferenceType`, and be hierarchical — unless
/// `node_class` is itself a type, in which case the reference type must
/// literally be `HasSubtype` and the parent's class must match exactly.
fn check_parent_reference(
    store: &NodeStore,
    node_class: ua::NodeClass,
    parent_node_id: &ua::NodeId,
    reference_type_id: &ua::NodeId,
) -> Result<()> {
    if !store.contains(parent_node_id) {
        log::info!("AddNodes: Parent node not found");
        return Err(Error::new(StatusCode::BAD_PARENT_NODE_ID_INVALID));
    }

    let Some(reference_type) = store.get_copy(reference_type_id) else {
        log::info!("AddNodes: Reference type to the parent not found");
        return Err(Error::new(StatusCode::BAD_REFERENCE_TYPE_ID_INVALID));
    };
    let NodeBody::ReferenceType(reference_type) = &reference_type.body else {
        log::info!("AddNodes: Reference type to the parent invalid");
        return Err(Error::new(StatusCode::BAD_REFERENCE_TYPE_ID_INVALID));
    };
    if reference_type.is_abstract {
        log::info!("AddNodes: Abstract reference type to the parent invalid");
        return Err(Error::new(StatusCode::BAD_REFERENCE_NOT_ALLOWED));
    }

    if node_class.is_type() {
        if *reference_type_id != ua::builtin::has_subtype() {
            log::info!("AddNodes: New type node needs a HasSubtype reference");
            return Err(Error::new(StatusCode::BAD_REFERENCE_NOT_ALLOWED));
        }
        let parent_class = store
            .with_node(parent_node_id, Node::node_class)
            .ok_or_else(|| Error::new(StatusCode::BAD_PARENT_NODE_ID_INVALID))?;
        if parent_class != node_class {
            log::info!("AddNodes: New type node needs a parent of the same node class");
            return Err(Error::new(StatusCode::BAD_PARENT_NODE_ID_INVALID));
        }
        return Ok(());
    }

    if !crate::reference::is_node_in_tree(
        store,
        reference_type_id,
        &[ua::builtin::hierarchical_references()],
        &[ua::builtin::has_subtype()],
    ) {
        log::info!("AddNodes: Reference to the parent is not hierarchical");
        return Err(Error::new(StatusCode::BAD_REFERENCE_TYPE_ID_INVALID));
    }

    Ok(())
}

/// `instantiateNode`: for Variable/Object nodes, copies the aggregated
/// children of the type's whole supertype hierarchy, runs the type's
/// constructor (if any), and adds the `HasTypeDefinition` reference.
fn instantiate_node(
    store: &NodeStore,
    node_id: &ua::NodeId,
    node_class: ua::NodeClass,
    type_id: &ua::NodeId,
    instantiation_callback: Option<&InstantiationCallback>,
) -> Result<()> {
    if !matches!(node_class, ua::NodeClass::Variable | ua::NodeClass::Object) {
        return Ok(());
    }

    let type_node = store
        .get_copy(type_id)
        .ok_or_else(|| Error::new(StatusCode::BAD_TYPE_DEFINITION_INVALID))?;

    match (node_class, &type_node.body) {
        (ua::NodeClass::Variable, NodeBody::VariableType(vt)) if !vt.is_abstract => {}
        (ua::NodeClass::Object, NodeBody::ObjectType(ot)) if !ot.is_abstract => {}
        _ => return Err(Error::new(StatusCode::BAD_TYPE_DEFINITION_INVALID)),
    }

    let hierarchy = get_type_hierarchy(store, type_id);
    for ancestor in &hierarchy {
        copy_child_nodes(store, ancestor, node_id, instantiation_callback)?;
    }

    if let NodeBody::ObjectType(object_type) = &type_node.body {
        if let Some(constructor) = object_type.lifecycle.constructor.clone() {
            store.edit(node_id, |node| {
                let NodeBody::Object(object) = &mut node.body else {
                    return Err(Error::new(StatusCode::BAD_NODE_CLASS_INVALID));
                };
                if object.instance_handle.is_none() {
                    object.instance_handle = Some(constructor(&node.node_id));
                }
                Ok(())
            })?;
        }
    }

    service_add_references_single(
        store,
        &AddReferencesItem {
            source_node_id: node_id.clone(),
            reference_type_id: ua::builtin::has_type_definition(),
            is_forward: true,
            target_node_id: type_id.clone().into(),
        },
    )?;

    if let Some(callback) = instantiation_callback {
        callback(node_id, type_id);
    }

    Ok(())
}

/// `getTypeHierarchy`: leaves-first (the type itself, then each supertype up
/// to the root), following `HasSubtype` inverse references.
fn get_type_hierarchy(store: &NodeStore, type_id: &ua::NodeId) -> Vec<ua::NodeId> {
    let has_subtype = ua::builtin::has_subtype();
    let mut hierarchy = vec![type_id.clone()];
    let mut current = type_id.clone();
    loop {
        let parent = store
            .with_node(&current, |node| {
                node.references.iter().find_map(|reference| {
                    (reference.is_inverse && reference.reference_type_id == has_subtype)
                        .then(|| reference.target_id.node_id().cloned())
                        .flatten()
                })
            })
            .flatten();
        match parent {
            Some(parent) if !hierarchy.contains(&parent) => {
                hierarchy.push(parent.clone());
                current = parent;
            }
            _ => break,
        }
    }
    hierarchy
}

fn aggregate_children_mask() -> ua::NodeClassMask {
    [ua::NodeClass::Object, ua::NodeClass::Variable, ua::NodeClass::Method]
        .into_iter()
        .collect()
}

fn get_node_type(node: &Node) -> ua::NodeId {
    let has_type_definition = ua::builtin::has_type_definition();
    node.references
        .iter()
        .find(|reference| !reference.is_inverse && reference.reference_type_id == has_type_definition)
        .and_then(|reference| reference.target_id.node_id().cloned())
        .unwrap_or_else(ua::NodeId::null)
}

/// Finds an aggregated child of `search_instance` with the given
/// `browse_name`, used by [`copy_child_node`] to detect a mergeable
/// existing child.
fn instance_find_aggregate_by_browse_name(
    store: &NodeStore,
    search_instance: &ua::NodeId,
    browse_name: &ua::QualifiedName,
) -> Result<Option<ua::NodeId>> {
    let mut desc = BrowseDescription::new(search_instance.clone(), ua::BrowseDirection::Forward);
    desc.reference_type_id = Some(ua::builtin::aggregates());
    desc.node_class_mask = aggregate_children_mask();

    let references = try_browse_single(store, &desc)?;
    Ok(references
        .into_iter()
        .find(|reference| reference.browse_name.as_ref() == Some(browse_name))
        .and_then(|reference| reference.target_id.into_node_id()))
}

/// `copyChildNodes`: copies every `Aggregates` child of `source_node_id`
/// onto `destination_node_id`.
fn copy_child_nodes(
    store: &NodeStore,
    source_node_id: &ua::NodeId,
    destination_node_id: &ua::NodeId,
    instantiation_callback: Option<&InstantiationCallback>,
) -> Result<()> {
    let mut desc = BrowseDescription::new(source_node_id.clone(), ua::BrowseDirection::Forward);
    desc.reference_type_id = Some(ua::builtin::aggregates());
    desc.node_class_mask = aggregate_children_mask();

    let references = try_browse_single(store, &desc)?;
    for reference in references {
        copy_child_node(store, destination_node_id, &reference, instantiation_callback)?;
    }
    Ok(())
}

/// `copyChildNode`: merges by `BrowseName` into an existing child (recursing
/// into it), links Method children without cloning them, or deep-copies
/// Variable/Object children into the instance's namespace and finishes them.
fn copy_child_node(
    store: &NodeStore,
    destination_node_id: &ua::NodeId,
    reference: &ReferenceDescription,
    instantiation_callback: Option<&InstantiationCallback>,
) -> Result<()> {
    let Some(browse_name) = &reference.browse_name else {
        return Ok(());
    };
    let existing = instance_find_aggregate_by_browse_name(store, destination_node_id, browse_name)?;

    if let Some(existing_child) = existing {
        if matches!(
            reference.node_class,
            Some(ua::NodeClass::Variable) | Some(ua::NodeClass::Object)
        ) {
            if let Some(source_id) = reference.target_id.node_id() {
                copy_child_nodes(store, source_id, &existing_child, instantiation_callback)?;
            }
        }
        return Ok(());
    }

    match reference.node_class {
        Some(ua::NodeClass::Method) => service_add_references_single(
            store,
            &AddReferencesItem {
                source_node_id: destination_node_id.clone(),
                reference_type_id: reference.reference_type_id.clone(),
                is_forward: true,
                target_node_id: reference.target_id.clone(),
            },
        ),
        Some(ua::NodeClass::Variable | ua::NodeClass::Object) => {
            let source_id = reference
                .target_id
                .node_id()
                .ok_or_else(|| Error::new(StatusCode::BAD_NODE_ID_INVALID))?;
            let mut node = store
                .get_copy(source_id)
                .ok_or_else(|| Error::new(StatusCode::BAD_NODE_ID_INVALID))?;

            let type_id = get_node_type(&node);
            node.references.clear();
            node.node_id = ua::NodeId::numeric(destination_node_id.namespace_index, 0);
            let new_id = store.insert(node)?;

            service_add_node_finish(
                store,
                &new_id,
                destination_node_id,
                &reference.reference_type_id,
                &type_id,
                instantiation_callback,
            )
        }
        _ => Ok(()),
    }
}

/// `Service_DeleteNodes_single`: invokes every object-type ancestor's
/// destructor (not just the nearest) before touching references, then
/// removes the references pointing at the node (if requested) and finally
/// removes the node itself.
pub fn service_delete_nodes_single(
    store: &NodeStore,
    node_id: &ua::NodeId,
    delete_references: bool,
) -> Result<()> {
    if let Some(handler) = store.namespace_handler(node_id.namespace_index) {
        if let Some(result) = handler.delete_node(node_id, delete_references) {
            return result;
        }
    }

    let node = store
        .get_copy(node_id)
        .ok_or_else(|| Error::new(StatusCode::BAD_NODE_ID_UNKNOWN))?;

    if node.node_class() == ua::NodeClass::Object {
        run_destructors(store, node_id, &node)?;
    }

    if delete_references {
        for reference in &node.references {
            let Some(target_id) = reference.target_id.node_id() else {
                continue;
            };
            let _: Result<()> = store.edit(target_id, |target_node| {
                crate::reference::delete_one_way(
                    target_node,
                    &reference.reference_type_id,
                    node_id,
                    reference.is_inverse,
                )
            });
        }
    }

    store.remove(node_id)?;
    Ok(())
}

fn run_destructors(store: &NodeStore, node_id: &ua::NodeId, node: &Node) -> Result<()> {
    let type_id = get_node_type(node);
    if type_id.is_null() {
        return Ok(());
    }

    let instance_handle = node.object().and_then(|object| object.instance_handle.clone());

    for ancestor in get_type_hierarchy(store, &type_id) {
        let Some(type_node) = store.get_copy(&ancestor) else {
            continue;
        };
        if let NodeBody::ObjectType(object_type) = &type_node.body {
            if let Some(destructor) = &object_type.lifecycle.destructor {
                destructor(node_id, instance_handle.as_ref());
            }
        }
    }
    Ok(())
}

/// `DeleteReferences` service item and single-item call (spec §4.2/§6);
/// re-exported here as node-management also drives it during cleanup.
pub use crate::reference::DeleteReferencesItem;

#[must_use]
pub fn service_delete_references_single_tolerant(
    store: &NodeStore,
    item: &DeleteReferencesItem,
) -> StatusCode {
    service_delete_references_single(store, item)
        .err()
        .map_or(StatusCode::GOOD, Error::status_code)
}

/// Editor callback: rebinds a Variable's value callback (spec §6 "Callback
/// surfaces exposed"). Fails with `BadNodeClassInvalid` off a non-Variable.
pub fn set_value_callback(store: &NodeStore, node_id: &ua::NodeId, callback: ValueCallback) -> Result<()> {
    store.edit(node_id, |node| {
        let NodeBody::Variable(variable) = &mut node.body else {
            return Err(Error::new(StatusCode::BAD_NODE_CLASS_INVALID));
        };
        if let crate::node::ValueSource::Data { callback: slot, .. } = &mut variable.value_source {
            *slot = Some(callback);
        } else {
            variable.value_source = crate::node::ValueSource::Data {
                value: ua::DataValue::default(),
                callback: Some(callback),
            };
        }
        Ok(())
    })
}

/// Editor callback: switches a Variable to a computed [`crate::node::DataSource`],
/// discarding any embedded value.
pub fn set_data_source(
    store: &NodeStore,
    node_id: &ua::NodeId,
    data_source: crate::node::DataSource,
) -> Result<()> {
    store.edit(node_id, |node| {
        let NodeBody::Variable(variable) = &mut node.body else {
            return Err(Error::new(StatusCode::BAD_NODE_CLASS_INVALID));
        };
        variable.value_source = crate::node::ValueSource::DataSource(data_source);
        Ok(())
    })
}

/// Editor callback: installs the constructor/destructor pair on an
/// `ObjectType`.
pub fn set_object_lifecycle(
    store: &NodeStore,
    node_id: &ua::NodeId,
    lifecycle: ObjectLifecycle,
) -> Result<()> {
    store.edit(node_id, |node| {
        let NodeBody::ObjectType(object_type) = &mut node.body else {
            return Err(Error::new(StatusCode::BAD_NODE_CLASS_INVALID));
        };
        object_type.lifecycle = lifecycle;
        Ok(())
    })
}

/// Editor callback: rebinds a Method's callback and context.
pub fn set_method_callback(store: &NodeStore, node_id: &ua::NodeId, callback: MethodCallback) -> Result<()> {
    store.edit(node_id, |node| {
        let NodeBody::Method(method) = &mut node.body else {
            return Err(Error::new(StatusCode::BAD_NODE_CLASS_INVALID));
        };
        method.callback = Some(callback);
        Ok(())
    })
}

/// Sets the opaque per-object instance handle directly, bypassing a
/// constructor. Used by callers that construct the handle themselves.
pub fn set_object_instance_handle(
    store: &NodeStore,
    node_id: &ua::NodeId,
    handle: InstanceHandle,
) -> Result<()> {
    store.edit(node_id, |node| {
        let NodeBody::Object(object) = &mut node.body else {
            return Err(Error::new(StatusCode::BAD_NODE_CLASS_INVALID));
        };
        object.instance_handle = Some(handle);
        Ok(())
    })
}
