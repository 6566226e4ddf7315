//! End-to-end exercise of the `AddNodes`/`DeleteNodes` surface through the
//! crate's public API only, against a store bootstrapped with the handful
//! of namespace-0 nodes instantiation actually depends on.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use opcua_core::{self as core, ua, AddNodesItem, AddReferencesItem, CommonAttributes, NodeAttributes, NodeStore};

fn bootstrap_store() -> NodeStore {
    let store = NodeStore::new(1);

    for (id, class) in [
        (ua::builtin::hierarchical_references(), ua::NodeClass::ReferenceType),
        (ua::builtin::organizes(), ua::NodeClass::ReferenceType),
        (ua::builtin::aggregates(), ua::NodeClass::ReferenceType),
        (ua::builtin::has_component(), ua::NodeClass::ReferenceType),
        (ua::builtin::has_subtype(), ua::NodeClass::ReferenceType),
        (ua::builtin::has_type_definition(), ua::NodeClass::ReferenceType),
        (ua::builtin::base_object_type(), ua::NodeClass::ObjectType),
        (ua::builtin::base_variable_type(), ua::NodeClass::VariableType),
        (ua::builtin::base_data_variable_type(), ua::NodeClass::VariableType),
        (ua::builtin::objects_folder(), ua::NodeClass::Object),
    ] {
        let mut node = core::Node::new(class);
        node.node_id = id;
        store.insert(node).unwrap();
    }

    store
        .edit(&ua::builtin::base_data_variable_type(), |node| {
            if let core::NodeBody::VariableType(variable_type) = &mut node.body {
                variable_type.data_type = ua::builtin::int32();
                variable_type.value_rank = -1;
            }
            Ok(())
        })
        .unwrap();

    for child in [
        ua::builtin::organizes(),
        ua::builtin::aggregates(),
        ua::builtin::has_component(),
    ] {
        core::service_add_references_single(
            &store,
            &AddReferencesItem {
                source_node_id: ua::builtin::hierarchical_references(),
                reference_type_id: ua::builtin::has_subtype(),
                is_forward: true,
                target_node_id: child.into(),
            },
        )
        .unwrap();
    }
    core::service_add_references_single(
        &store,
        &AddReferencesItem {
            source_node_id: ua::builtin::aggregates(),
            reference_type_id: ua::builtin::has_subtype(),
            is_forward: true,
            target_node_id: ua::builtin::has_component().into(),
        },
    )
    .unwrap();
    core::service_add_references_single(
        &store,
        &AddReferencesItem {
            source_node_id: ua::builtin::base_variable_type(),
            reference_type_id: ua::builtin::has_subtype(),
            is_forward: true,
            target_node_id: ua::builtin::base_data_variable_type().into(),
        },
    )
    .unwrap();

    store
}

fn add_variable(store: &NodeStore, parent: &ua::NodeId, name: &str, value: i32) -> ua::NodeId {
    let item = AddNodesItem {
        parent_node_id: parent.clone(),
        reference_type_id: ua::builtin::organizes(),
        requested_new_node_id: ua::NodeId::numeric(1, 0),
        browse_name: ua::QualifiedName::new(1, name),
        node_class: ua::NodeClass::Variable,
        node_attributes: NodeAttributes::Variable {
            common: CommonAttributes::default(),
            data_type: ua::builtin::int32(),
            value_rank: -1,
            array_dimensions: Vec::new(),
            access_level: ua::AccessLevel::default(),
            historizing: false,
            minimum_sampling_interval: ua::Duration::default(),
            value: Some(ua::Variant::from(value)),
        },
        type_definition: ua::NodeId::null(),
    };
    let node_id = core::service_add_node_begin(store, &item).unwrap();
    core::service_add_node_finish(
        store,
        &node_id,
        &item.parent_node_id,
        &item.reference_type_id,
        &item.type_definition,
        None,
    )
    .unwrap();
    node_id
}

/// AddNodes followed by a Browse: the new variable shows up forward from its
/// parent and can be found again by browsing `HasTypeDefinition`.
#[test]
fn add_then_browse_round_trips() {
    let store = bootstrap_store();
    let id = add_variable(&store, &ua::builtin::objects_folder(), "temperature", 21);

    let mut desc = core::BrowseDescription::new(ua::builtin::objects_folder(), ua::BrowseDirection::Forward);
    desc.reference_type_id = Some(ua::builtin::organizes());
    let references = core::try_browse_single(&store, &desc).unwrap();
    assert!(references.iter().any(|r| r.target_id.node_id() == Some(&id)));

    let mut type_desc = core::BrowseDescription::new(id.clone(), ua::BrowseDirection::Forward);
    type_desc.reference_type_id = Some(ua::builtin::has_type_definition());
    let type_refs = core::try_browse_single(&store, &type_desc).unwrap();
    assert_eq!(type_refs.len(), 1);
    assert_eq!(type_refs[0].target_id.node_id(), Some(&ua::builtin::base_data_variable_type()));
}

/// Instantiating an object type whose variable child has a constructor
/// registered runs that constructor once for the new instance, and deleting
/// the instance runs its destructor.
#[test]
fn object_instantiation_and_deletion_run_lifecycle_callbacks() {
    let store = bootstrap_store();

    let mut object_type = core::Node::new(ua::NodeClass::ObjectType);
    object_type.node_id = ua::NodeId::numeric(1, 100);
    let type_id = store.insert(object_type).unwrap();
    core::service_add_references_single(
        &store,
        &AddReferencesItem {
            source_node_id: ua::builtin::base_object_type(),
            reference_type_id: ua::builtin::has_subtype(),
            is_forward: true,
            target_node_id: type_id.clone().into(),
        },
    )
    .unwrap();

    let constructed = Arc::new(AtomicUsize::new(0));
    let destructed = Arc::new(AtomicUsize::new(0));
    {
        let constructed = constructed.clone();
        let destructed = destructed.clone();
        core::set_object_lifecycle(
            &store,
            &type_id,
            core::ObjectLifecycle {
                constructor: Some(Arc::new(move |_node_id: &ua::NodeId| -> core::InstanceHandle {
                    constructed.fetch_add(1, Ordering::SeqCst);
                    Arc::new(())
                })),
                destructor: Some(Arc::new(move |_node_id, _handle| {
                    destructed.fetch_add(1, Ordering::SeqCst);
                })),
            },
        )
        .unwrap();
    }

    let item = AddNodesItem {
        parent_node_id: ua::builtin::objects_folder(),
        reference_type_id: ua::builtin::organizes(),
        requested_new_node_id: ua::NodeId::numeric(1, 0),
        browse_name: ua::QualifiedName::new(1, "device1"),
        node_class: ua::NodeClass::Object,
        node_attributes: NodeAttributes::Object {
            common: CommonAttributes::default(),
            event_notifier: 0,
        },
        type_definition: type_id,
    };
    let instance_id = core::service_add_node_begin(&store, &item).unwrap();
    core::service_add_node_finish(
        &store,
        &instance_id,
        &item.parent_node_id,
        &item.reference_type_id,
        &item.type_definition,
        None,
    )
    .unwrap();
    assert_eq!(constructed.load(Ordering::SeqCst), 1);

    core::service_delete_nodes_single(&store, &instance_id, true).unwrap();
    assert_eq!(destructed.load(Ordering::SeqCst), 1);
    assert!(!store.contains(&instance_id));
}

/// Deleting a node with `delete_references = false` removes the node itself
/// but leaves the far end of its references (here, the parent's forward
/// `Organizes` reference) untouched.
#[test]
fn delete_without_target_references_leaves_parent_reference() {
    let store = bootstrap_store();
    let id = add_variable(&store, &ua::builtin::objects_folder(), "v1", 1);

    core::service_delete_nodes_single(&store, &id, false).unwrap();
    assert!(!store.contains(&id));

    let mut desc = core::BrowseDescription::new(ua::builtin::objects_folder(), ua::BrowseDirection::Forward);
    desc.reference_type_id = Some(ua::builtin::organizes());
    let references = core::try_browse_single(&store, &desc).unwrap();
    assert!(references.iter().any(|r| r.target_id.node_id() == Some(&id)));
}
