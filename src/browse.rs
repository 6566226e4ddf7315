//! Browser (spec §4.4, C4): filtered reference traversal from a single
//! source node. Used directly by `Browse` and internally by instantiation
//! (enumerating `Aggregates` children) and deletion (locating destructors
//! via inverse `HasSubtype`).

use crate::{reference::is_reference_type_match, store::NodeStore, ua, Result};
use crate::ua::StatusCode;

/// A single `Browse` service item (spec §6).
#[derive(Debug, Clone)]
pub struct BrowseDescription {
    pub node_id: ua::NodeId,
    pub browse_direction: ua::BrowseDirection,
    /// `None` means "any reference type".
    pub reference_type_id: Option<ua::NodeId>,
    pub include_subtypes: bool,
    pub node_class_mask: ua::NodeClassMask,
}

impl BrowseDescription {
    #[must_use]
    pub const fn new(node_id: ua::NodeId, browse_direction: ua::BrowseDirection) -> Self {
        Self {
            node_id,
            browse_direction,
            reference_type_id: None,
            include_subtypes: true,
            node_class_mask: ua::NodeClassMask::all(),
        }
    }
}

/// A single browsed reference, with target metadata filled in when the
/// target is local and still present in the store.
#[derive(Debug, Clone)]
pub struct ReferenceDescription {
    pub reference_type_id: ua::NodeId,
    pub is_forward: bool,
    pub target_id: ua::ExpandedNodeId,
    pub browse_name: Option<ua::QualifiedName>,
    pub display_name: Option<ua::LocalizedText>,
    pub node_class: Option<ua::NodeClass>,
}

#[derive(Debug, Clone)]
pub struct BrowseResult {
    pub status_code: ua::StatusCode,
    pub references: Vec<ReferenceDescription>,
}

/// `browseSingle`: walks `desc.node_id`'s references, keeping those that
/// match `browse_direction`, `reference_type_id` (with subtypes, via
/// [`is_reference_type_match`]) and, for references whose target is local
/// and resolvable, `node_class_mask`.
#[must_use]
pub fn browse_single(store: &NodeStore, desc: &BrowseDescription) -> BrowseResult {
    let Some(references) = store.with_node(&desc.node_id, |node| node.references.clone()) else {
        return BrowseResult {
            status_code: StatusCode::BAD_NODE_ID_UNKNOWN,
            references: Vec::new(),
        };
    };

    let results = references
        .into_iter()
        .filter(|reference| desc.browse_direction.accepts(reference.is_inverse))
        .filter(|reference| match &desc.reference_type_id {
            None => true,
            Some(wanted) if !desc.include_subtypes => reference.reference_type_id == *wanted,
            Some(wanted) => is_reference_type_match(store, &reference.reference_type_id, &[wanted.clone()]),
        })
        .filter_map(|reference| {
            let target_node = reference
                .target_id
                .node_id()
                .and_then(|id| store.with_node(id, |node| (node.node_class(), node.browse_name.clone(), node.display_name.clone())));

            let (node_class, browse_name, display_name) = match target_node {
                Some((class, browse_name, display_name)) => {
                    if !desc.node_class_mask.matches(class) {
                        return None;
                    }
                    (Some(class), Some(browse_name), Some(display_name))
                }
                None => (None, None, None),
            };

            Some(ReferenceDescription {
                reference_type_id: reference.reference_type_id,
                is_forward: !reference.is_inverse,
                target_id: reference.target_id,
                browse_name,
                display_name,
                node_class,
            })
        })
        .collect();

    BrowseResult {
        status_code: StatusCode::GOOD,
        references: results,
    }
}

/// Convenience used by node-management: ids reachable in one hop matching
/// `browse_single`'s filters, dropping any descriptive fields.
#[must_use]
pub fn browse_target_ids(store: &NodeStore, desc: &BrowseDescription) -> Vec<ua::NodeId> {
    browse_single(store, desc)
        .references
        .into_iter()
        .filter_map(|reference| reference.target_id.into_node_id())
        .collect()
}

/// Fails with `BadNodeIdUnknown` if `node_id` is absent; a thin `Result`
/// wrapper around [`browse_single`] for call sites that want `?`.
pub fn try_browse_single(store: &NodeStore, desc: &BrowseDescription) -> Result<Vec<ReferenceDescription>> {
    let result = browse_single(store, desc);
    if result.status_code.is_good() {
        Ok(result.references)
    } else {
        Err(crate::Error::new(result.status_code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        node::Node,
        reference::{service_add_references_single, AddReferencesItem},
    };

    #[test]
    fn browse_forward_filters_by_reference_type() {
        let store = NodeStore::new(1);
        let parent = ua::NodeId::numeric(0, 1);
        let child = ua::NodeId::numeric(0, 2);
        for id in [parent.clone(), child.clone()] {
            let mut node = Node::new(ua::NodeClass::Object);
            node.node_id = id;
            store.insert(node).unwrap();
        }
        service_add_references_single(
            &store,
            &AddReferencesItem {
                source_node_id: parent.clone(),
                reference_type_id: ua::builtin::organizes(),
                is_forward: true,
                target_node_id: child.clone().into(),
            },
        )
        .unwrap();

        let mut desc = BrowseDescription::new(parent, ua::BrowseDirection::Forward);
        desc.reference_type_id = Some(ua::builtin::organizes());
        let result = browse_single(&store, &desc);
        assert_eq!(result.references.len(), 1);
        assert_eq!(result.references[0].target_id.node_id(), Some(&child));
    }

    #[test]
    fn browse_unknown_node_is_bad_node_id_unknown() {
        let store = NodeStore::new(1);
        let result = browse_single(
            &store,
            &BrowseDescription::new(ua::NodeId::numeric(0, 1), ua::BrowseDirection::Both),
        );
        assert_eq!(result.status_code, StatusCode::BAD_NODE_ID_UNKNOWN);
    }
}
