//! External namespace delegation (spec §9 "External-namespace hooks").
//!
//! The original conditionally compiles an `UA_ExternalNodeStore` branch that
//! gets first refusal on every node-management call whose target namespace
//! it owns. We model that as a polymorphic lookup: [`NodeStore`](crate::store::NodeStore)
//! holds a small registry of handlers keyed by namespace index, and
//! [`crate::node_management`] asks the registry before touching local
//! storage. This is optional (spec §1 Non-goals) — a store with no
//! registered handlers behaves exactly as if the feature did not exist.

use crate::{node_management::AddNodesItem, ua, Result};

/// A namespace delegate that may claim node-management operations targeting
/// its namespace index.
///
/// Every method returns `None` to mean "not claimed, fall through to the
/// local store" and `Some(result)` to mean "handled, use this result".
pub trait NamespaceHandler: Send + Sync {
    fn add_node(&self, _item: &AddNodesItem) -> Option<Result<ua::NodeId>> {
        None
    }

    fn add_reference(
        &self,
        _source: &ua::NodeId,
        _reference_type_id: &ua::NodeId,
        _target: &ua::ExpandedNodeId,
        _is_forward: bool,
    ) -> Option<Result<()>> {
        None
    }

    fn delete_node(&self, _node_id: &ua::NodeId, _delete_references: bool) -> Option<Result<()>> {
        None
    }

    fn delete_reference(
        &self,
        _source: &ua::NodeId,
        _reference_type_id: &ua::NodeId,
        _target: &ua::ExpandedNodeId,
        _is_forward: bool,
    ) -> Option<Result<()>> {
        None
    }
}
