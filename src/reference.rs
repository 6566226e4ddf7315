//! Reference engine (spec §4.2, C2): bidirectional reference add/delete and
//! the hierarchy walk used to classify reference types and enumerate
//! children during instantiation.

use std::collections::{HashSet, VecDeque};

use crate::{
    node::{Node, Reference},
    store::NodeStore,
    ua, Error, Result,
};
use crate::ua::StatusCode;

/// A single `AddReferences` service item (spec §6).
#[derive(Debug, Clone)]
pub struct AddReferencesItem {
    pub source_node_id: ua::NodeId,
    pub reference_type_id: ua::NodeId,
    pub is_forward: bool,
    pub target_node_id: ua::ExpandedNodeId,
}

/// A single `DeleteReferences` service item (spec §6).
#[derive(Debug, Clone)]
pub struct DeleteReferencesItem {
    pub source_node_id: ua::NodeId,
    pub reference_type_id: ua::NodeId,
    pub is_forward: bool,
    pub target_node_id: ua::ExpandedNodeId,
    pub delete_bidirectional: bool,
}

/// Appends a reference to `node`, growing the backing vector with
/// geometric slack: capacity is rounded up to `(len + 1) | 3` so that a
/// reallocation is not needed on every single append. This exact formula
/// (not a generic doubling strategy) is carried over from the original.
pub(crate) fn add_one_way(
    node: &mut Node,
    reference_type_id: ua::NodeId,
    target_id: ua::ExpandedNodeId,
    is_forward: bool,
) {
    let len = node.references.len();
    if node.references.capacity() <= len {
        let target_capacity = (len + 1) | 3;
        node.references.reserve_exact(target_capacity - len);
    }
    node.references
        .push(Reference::new(reference_type_id, target_id, !is_forward));
}

/// Removes the last (by index) reference matching `(target_id,
/// reference_type_id, is_forward)`, swap-removing with the tail entry.
/// Returns `UncertainReferenceNotDeleted` if no match is found.
pub(crate) fn delete_one_way(
    node: &mut Node,
    reference_type_id: &ua::NodeId,
    target_id: &ua::NodeId,
    is_forward: bool,
) -> Result<()> {
    let is_inverse = !is_forward;
    let position = node.references.iter().rposition(|reference| {
        reference.is_inverse == is_inverse
            && reference.reference_type_id == *reference_type_id
            && reference.target_id.node_id() == Some(target_id)
    });
    match position {
        Some(index) => {
            node.references.swap_remove(index);
            Ok(())
        }
        None => Err(Error::new(StatusCode::UNCERTAIN_REFERENCE_NOT_DELETED)),
    }
}

/// `Service_AddReferences_single`: writes the forward reference, then the
/// mirror with swapped roles and negated direction. Rolls the forward
/// reference back if the mirror write fails.
pub fn service_add_references_single(store: &NodeStore, item: &AddReferencesItem) -> Result<()> {
    if let Some(handler) = store.namespace_handler(item.source_node_id.namespace_index) {
        if let Some(result) = handler.add_reference(
            &item.source_node_id,
            &item.reference_type_id,
            &item.target_node_id,
            item.is_forward,
        ) {
            return result;
        }
    }

    if !item.target_node_id.is_local() {
        return Err(Error::new(StatusCode::BAD_NOT_IMPLEMENTED));
    }
    let Some(target_id) = item.target_node_id.node_id().cloned() else {
        return Err(Error::new(StatusCode::BAD_NODE_ID_INVALID));
    };

    store.edit(&item.source_node_id, |node| {
        add_one_way(
            node,
            item.reference_type_id.clone(),
            item.target_node_id.clone(),
            item.is_forward,
        );
        Ok(())
    })?;

    let mirror = store.edit(&target_id, |node| {
        add_one_way(
            node,
            item.reference_type_id.clone(),
            ua::ExpandedNodeId::local(item.source_node_id.clone()),
            !item.is_forward,
        );
        Ok(())
    });

    if let Err(err) = mirror {
        // Roll back the forward reference; ignore the outcome as the
        // original does (the mirror's error already surfaces below).
        let _: Result<()> = store.edit(&item.source_node_id, |node| {
            delete_one_way(node, &item.reference_type_id, &target_id, item.is_forward)
        });
        return Err(err);
    }

    Ok(())
}

/// `Service_DeleteReferences_single`: deletes source→target, and if
/// `delete_bidirectional` and the target is local, deletes the mirror too.
pub fn service_delete_references_single(
    store: &NodeStore,
    item: &DeleteReferencesItem,
) -> Result<()> {
    if let Some(handler) = store.namespace_handler(item.source_node_id.namespace_index) {
        if let Some(result) = handler.delete_reference(
            &item.source_node_id,
            &item.reference_type_id,
            &item.target_node_id,
            item.is_forward,
        ) {
            return result;
        }
    }

    let Some(target_id) = item.target_node_id.node_id() else {
        return Err(Error::new(StatusCode::BAD_NODE_ID_INVALID));
    };

    store.edit(&item.source_node_id, |node| {
        delete_one_way(node, &item.reference_type_id, target_id, item.is_forward)
    })?;

    if !item.delete_bidirectional || !item.target_node_id.is_local() {
        return Ok(());
    }

    store.edit(target_id, |node| {
        delete_one_way(
            node,
            &item.reference_type_id,
            &item.source_node_id,
            !item.is_forward,
        )
    })
}

/// Breadth-first walk from `start`, following only inverse references whose
/// type is (a subtype of) one of `relation_reference_type_ids`; returns
/// true if any of `roots` is reached. Used to verify that a reference type
/// is hierarchical, and to walk type hierarchies (`HasSubtype`).
#[must_use]
pub fn is_node_in_tree(
    store: &NodeStore,
    start: &ua::NodeId,
    roots: &[ua::NodeId],
    relation_reference_type_ids: &[ua::NodeId],
) -> bool {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(start.clone());

    while let Some(current) = queue.pop_front() {
        if roots.iter().any(|root| *root == current) {
            return true;
        }
        if !visited.insert(current.clone()) {
            continue;
        }
        let Some(next) = store.with_node(&current, |node| {
            node.references
                .iter()
                .filter(|reference| {
                    reference.is_inverse
                        && is_reference_type_match(
                            store,
                            &reference.reference_type_id,
                            relation_reference_type_ids,
                        )
                })
                .filter_map(|reference| reference.target_id.node_id().cloned())
                .collect::<Vec<_>>()
        }) else {
            continue;
        };
        queue.extend(next);
    }
    false
}

/// Whether `candidate` is (a subtype of) one of `allowed`, walking the
/// `HasSubtype` hierarchy upward from `candidate`.
pub(crate) fn is_reference_type_match(store: &NodeStore, candidate: &ua::NodeId, allowed: &[ua::NodeId]) -> bool {
    if allowed.iter().any(|id| id == candidate) {
        return true;
    }

    let has_subtype = ua::builtin::has_subtype();
    let mut visited = HashSet::new();
    let mut current = candidate.clone();
    loop {
        if !visited.insert(current.clone()) {
            return false;
        }
        let parent = store.with_node(&current, |node| {
            node.references.iter().find_map(|reference| {
                if reference.is_inverse && reference.reference_type_id == has_subtype {
                    reference.target_id.node_id().cloned()
                } else {
                    None
                }
            })
        });
        let Some(Some(parent)) = parent else {
            return false;
        };
        if allowed.iter().any(|id| *id == parent) {
            return true;
        }
        current = parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn store_with(a: ua::NodeId, b: ua::NodeId) -> NodeStore {
        let store = NodeStore::new(1);
        for id in [a, b] {
            let mut node = Node::new(ua::NodeClass::Object);
            node.node_id = id;
            store.insert(node).unwrap();
        }
        store
    }

    #[test]
    fn add_references_creates_mirror() {
        let a = ua::NodeId::numeric(0, 1);
        let b = ua::NodeId::numeric(0, 2);
        let store = store_with(a.clone(), b.clone());

        let organizes = ua::builtin::organizes();
        service_add_references_single(
            &store,
            &AddReferencesItem {
                source_node_id: a.clone(),
                reference_type_id: organizes.clone(),
                is_forward: true,
                target_node_id: b.clone().into(),
            },
        )
        .unwrap();

        assert!(store
            .with_node(&a, |node| node
                .references
                .iter()
                .any(|r| !r.is_inverse && r.target_id.node_id() == Some(&b)))
            .unwrap());
        assert!(store
            .with_node(&b, |node| node
                .references
                .iter()
                .any(|r| r.is_inverse && r.target_id.node_id() == Some(&a)))
            .unwrap());
    }

    #[test]
    fn delete_bidirectional_removes_both_sides() {
        let a = ua::NodeId::numeric(0, 1);
        let b = ua::NodeId::numeric(0, 2);
        let store = store_with(a.clone(), b.clone());
        let organizes = ua::builtin::organizes();

        service_add_references_single(
            &store,
            &AddReferencesItem {
                source_node_id: a.clone(),
                reference_type_id: organizes.clone(),
                is_forward: true,
                target_node_id: b.clone().into(),
            },
        )
        .unwrap();

        service_delete_references_single(
            &store,
            &DeleteReferencesItem {
                source_node_id: a.clone(),
                reference_type_id: organizes,
                is_forward: true,
                target_node_id: b.clone().into(),
                delete_bidirectional: true,
            },
        )
        .unwrap();

        assert!(store.with_node(&a, |node| node.references.is_empty()).unwrap());
        assert!(store.with_node(&b, |node| node.references.is_empty()).unwrap());
    }

    #[test]
    fn delete_without_match_is_uncertain() {
        let a = ua::NodeId::numeric(0, 1);
        let b = ua::NodeId::numeric(0, 2);
        let store = store_with(a.clone(), b.clone());

        let err = service_delete_references_single(
            &store,
            &DeleteReferencesItem {
                source_node_id: a,
                reference_type_id: ua::builtin::organizes(),
                is_forward: true,
                target_node_id: b.into(),
                delete_bidirectional: false,
            },
        )
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNCERTAIN_REFERENCE_NOT_DELETED);
    }

    #[test]
    fn is_node_in_tree_finds_hierarchical_reference_types() {
        let store = NodeStore::new(1);
        let hierarchical = ua::builtin::hierarchical_references();
        let organizes = ua::builtin::organizes();
        let has_subtype = ua::builtin::has_subtype();

        for id in [hierarchical.clone(), organizes.clone()] {
            let mut node = Node::new(ua::NodeClass::ReferenceType);
            node.node_id = id;
            store.insert(node).unwrap();
        }
        // organizes --inverse(HasSubtype)--> hierarchical
        service_add_references_single(
            &store,
            &AddReferencesItem {
                source_node_id: hierarchical.clone(),
                reference_type_id: has_subtype,
                is_forward: true,
                target_node_id: organizes.clone().into(),
            },
        )
        .unwrap();

        assert!(is_node_in_tree(
            &store,
            &organizes,
            &[hierarchical],
            &[ua::builtin::has_subtype()]
        ));
    }
}
