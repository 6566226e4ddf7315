//! Address-space/node-management core and subscription client engine for an
//! OPC UA (IEC 62541) stack.
//!
//! This crate implements the two subsystems of an OPC UA implementation
//! where the protocol semantics actually live: the server-side address
//! space ([`store`], [`reference`], [`type_check`], [`browse`],
//! [`node_management`]) and the client-side subscription/publish engine
//! ([`subscription`]). Everything below a single blocking request/response
//! exchange — binary encoding, the secure channel, transport sockets,
//! session authentication, discovery, and the standard-namespace bootstrap
//! dataset — is a named external collaborator this crate consumes through
//! the [`Transport`] trait rather than implements.
//!
//! # Layout
//!
//! - [`ua`] — decoded wire-level value types (`NodeId`, `StatusCode`,
//!   `Variant`, ...) that the transport and attribute catalog are assumed to
//!   hand to the core.
//! - [`node`] / [`store`] — the node graph and its owning store.
//! - [`reference`] / [`browse`] — reference add/delete and filtered
//!   traversal.
//! - [`type_check`] — data type / value rank / array dimension compatibility.
//! - [`attributes`] / [`node_management`] — the `AddNodes`/`DeleteNodes`
//!   service layer, including type instantiation.
//! - [`session`] — the local admin session and its continuation-point queue.
//! - [`subscription`] — the client-side subscription/monitored-item
//!   lifecycle and Publish loop.
//! - [`transport`] — the seam a real binary codec/secure-channel
//!   implementation plugs into.
//! - [`namespace`] — optional external-namespace delegation.
//! - [`config`] — client/server tunables.
//!
//! Most types are re-exported flat at the crate root, the way `open62541`'s
//! own `ua::` prefix convention disambiguates otherwise-generic names
//! (`Node`, `Reference`, `Client`) — see the `module_name_repetitions`
//! allowance in `Cargo.toml`.

mod attributes;
mod browse;
mod config;
mod error;
mod namespace;
mod node;
mod node_management;
mod reference;
mod session;
mod store;
mod subscription;
mod transport;
mod type_check;
pub mod ua;

pub use self::{
    attributes::{create_node_from_attributes, CommonAttributes, NodeAttributes},
    browse::{browse_single, browse_target_ids, try_browse_single, BrowseDescription, BrowseResult, ReferenceDescription},
    config::{ClientConfig, ServerConfig},
    error::{Error, Result},
    namespace::NamespaceHandler,
    node::{
        DataSource, InstanceHandle, MethodCallback, MethodContext, MethodNode, Node, NodeBody,
        ObjectLifecycle, ObjectNode, ObjectTypeNode, Reference, ReferenceTypeNode, DataTypeNode,
        ValueCallback, ValueSource, VariableNode, VariableTypeNode, ViewNode,
    },
    node_management::{
        service_add_node_begin, service_add_node_finish, service_delete_nodes_single,
        service_delete_references_single_tolerant, set_data_source, set_method_callback,
        set_object_instance_handle, set_object_lifecycle, set_value_callback, AddNodesItem,
        DeleteNodesItem, InstantiationCallback,
    },
    reference::{
        is_node_in_tree, service_add_references_single, service_delete_references_single,
        AddReferencesItem, DeleteReferencesItem,
    },
    session::{admin_session, ContinuationPoint, Session},
    store::NodeStore,
    subscription::{
        Client, ContentFilterElement, CreateMonitoredItemsRequest, CreateMonitoredItemsResponse,
        CreateSubscriptionRequest, CreateSubscriptionResponse, DataChangeHandler,
        DataChangeNotification, DeleteMonitoredItemsRequest, DeleteMonitoredItemsResponse,
        DeleteSubscriptionsRequest, DeleteSubscriptionsResponse, EventFieldList, EventFilter,
        EventHandler, EventNotificationList, FilterOperator, MonitoredItem,
        MonitoredItemCreateRequest, MonitoredItemCreateResult, MonitoredItemId,
        MonitoredItemNotification, MonitoringFilter, NotificationData, NotificationMessage,
        PublishRequest, PublishResponse, SessionState, SimpleAttributeOperand, Subscription,
        SubscriptionAcknowledgement, SubscriptionId, SubscriptionSettings,
    },
    transport::{
        AddNodesResponse, AddNodesResult, AddReferencesResponse, BrowseResponse,
        DeleteNodesResponse, DeleteReferencesResponse, ServiceCall, ServiceResponse, Transport,
    },
    type_check::type_check_variable_node,
};
