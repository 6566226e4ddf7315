//! NodeStore (spec §4.1, C1): owns the node graph.
//!
//! Backed by a single `parking_lot::RwLock<HashMap<NodeId, Node>>`, matching
//! the "single `RwLock` as the RCU-like backing store" choice recorded in
//! DESIGN.md: a read guard is the reader's grace period, a write guard is
//! the writer's critical section, and no borrow from either ever escapes
//! past the call that produced it (`get` clones out, `edit` runs a callback
//! under the lock).

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use rand::Rng as _;

use crate::{namespace::NamespaceHandler, node::Node, ua, Error, Result};
use crate::ua::StatusCode;

pub struct NodeStore {
    nodes: RwLock<HashMap<ua::NodeId, Node>>,
    namespace_count: RwLock<u16>,
    namespace_handlers: RwLock<HashMap<u16, Arc<dyn NamespaceHandler>>>,
}

impl NodeStore {
    /// Creates an empty store with `namespace_count` namespaces known
    /// (indices `0..namespace_count` are considered valid), mirroring
    /// `server->namespacesSize`.
    #[must_use]
    pub fn new(namespace_count: u16) -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            namespace_count: RwLock::new(namespace_count),
            namespace_handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a bare node of the given class, as `UA_NodeStore_newNode`.
    #[must_use]
    pub fn new_node(&self, node_class: ua::NodeClass) -> Node {
        Node::new(node_class)
    }

    /// Registers a namespace, growing `namespace_count` to cover it if
    /// necessary. Used to add a dynamic namespace beyond the ones the store
    /// was constructed with.
    pub fn add_namespace(&self, index: u16) {
        let mut count = self.namespace_count.write();
        if index >= *count {
            *count = index + 1;
        }
    }

    #[must_use]
    pub fn is_valid_namespace(&self, index: u16) -> bool {
        index < *self.namespace_count.read()
    }

    /// Installs an external namespace delegate (spec §9), optional.
    pub fn register_namespace(&self, index: u16, handler: Arc<dyn NamespaceHandler>) {
        self.namespace_handlers.write().insert(index, handler);
    }

    #[must_use]
    pub fn namespace_handler(&self, index: u16) -> Option<Arc<dyn NamespaceHandler>> {
        self.namespace_handlers.read().get(&index).cloned()
    }

    /// Inserts `node`, allocating a random numeric id within its requested
    /// namespace if its identifier is the null sentinel (spec §3 invariant 1).
    pub fn insert(&self, mut node: Node) -> Result<ua::NodeId> {
        let mut nodes = self.nodes.write();

        if node.node_id.has_null_identifier() {
            let namespace_index = node.node_id.namespace_index;
            loop {
                let candidate = ua::NodeId::numeric(namespace_index, rand::rng().random());
                if !nodes.contains_key(&candidate) {
                    node.node_id = candidate;
                    break;
                }
            }
        } else if nodes.contains_key(&node.node_id) {
            return Err(Error::new(StatusCode::BAD_NODE_ID_INVALID));
        }

        let id = node.node_id.clone();
        nodes.insert(id.clone(), node);
        Ok(id)
    }

    /// Returns a deep copy of the node, for mutation outside the store or to
    /// carry across an [`edit`](Self::edit) boundary.
    #[must_use]
    pub fn get_copy(&self, id: &ua::NodeId) -> Option<Node> {
        self.nodes.read().get(id).cloned()
    }

    /// Runs `f` on a read-only view of the node, returning `None` if it is
    /// unknown. Unlike `getCopy`, this never clones the node.
    pub fn with_node<R>(&self, id: &ua::NodeId, f: impl FnOnce(&Node) -> R) -> Option<R> {
        self.nodes.read().get(id).map(f)
    }

    #[must_use]
    pub fn contains(&self, id: &ua::NodeId) -> bool {
        self.nodes.read().contains_key(id)
    }

    /// Hands `f` a mutable borrow of the node under the store's write lock:
    /// the only mutation path into the store (spec §4 "Editor pattern").
    pub fn edit<R>(
        &self,
        id: &ua::NodeId,
        f: impl FnOnce(&mut Node) -> Result<R>,
    ) -> Result<R> {
        let mut nodes = self.nodes.write();
        let node = nodes
            .get_mut(id)
            .ok_or_else(|| Error::new(StatusCode::BAD_NODE_ID_UNKNOWN))?;
        f(node)
    }

    /// Removes and returns the node, or `BadNodeIdUnknown` if it is absent.
    pub fn remove(&self, id: &ua::NodeId) -> Result<Node> {
        self.nodes
            .write()
            .remove(id)
            .ok_or_else(|| Error::new(StatusCode::BAD_NODE_ID_UNKNOWN))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}

impl std::fmt::Debug for NodeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeStore")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
