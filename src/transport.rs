//! Transport (spec §6.1, C10): the wire/secure-channel seam.
//!
//! Everything below `Service_*` in the original — chunking, the secure
//! channel, session activation — is a named external collaborator this core
//! never touches. [`Transport`] is the whole of that boundary as seen from
//! here: one blocking call in, one response out, keyed by a closed enum of
//! the services this core actually issues.

use crate::{
    browse::{BrowseDescription, BrowseResult},
    node_management::{AddNodesItem, DeleteNodesItem},
    reference::{AddReferencesItem, DeleteReferencesItem},
    subscription::{
        CreateMonitoredItemsRequest, CreateMonitoredItemsResponse, CreateSubscriptionRequest,
        CreateSubscriptionResponse, DeleteMonitoredItemsRequest, DeleteMonitoredItemsResponse,
        DeleteSubscriptionsRequest, DeleteSubscriptionsResponse, PublishRequest, PublishResponse,
    },
    ua, Result,
};

/// One outgoing service call. A request that is naturally a list of items
/// (`AddNodes`, `Browse`, ...) carries the list directly rather than a
/// wrapper struct — there is no service-level request header this core
/// needs to round-trip.
#[derive(Debug, Clone)]
pub enum ServiceCall {
    CreateSubscription(CreateSubscriptionRequest),
    CreateMonitoredItems(CreateMonitoredItemsRequest),
    Publish(PublishRequest),
    DeleteMonitoredItems(DeleteMonitoredItemsRequest),
    DeleteSubscriptions(DeleteSubscriptionsRequest),
    AddNodes(Vec<AddNodesItem>),
    AddReferences(Vec<AddReferencesItem>),
    DeleteNodes(Vec<DeleteNodesItem>),
    DeleteReferences(Vec<DeleteReferencesItem>),
    Browse(Vec<BrowseDescription>),
}

/// The matching response, tagged the same way.
#[derive(Debug)]
pub enum ServiceResponse {
    CreateSubscription(CreateSubscriptionResponse),
    CreateMonitoredItems(CreateMonitoredItemsResponse),
    Publish(PublishResponse),
    DeleteMonitoredItems(DeleteMonitoredItemsResponse),
    DeleteSubscriptions(DeleteSubscriptionsResponse),
    AddNodes(AddNodesResponse),
    AddReferences(AddReferencesResponse),
    DeleteNodes(DeleteNodesResponse),
    DeleteReferences(DeleteReferencesResponse),
    Browse(BrowseResponse),
}

#[derive(Debug, Clone)]
pub struct AddNodesResult {
    pub status_code: ua::StatusCode,
    pub added_node_id: ua::NodeId,
}

#[derive(Debug, Clone)]
pub struct AddNodesResponse {
    pub service_result: ua::StatusCode,
    pub results: Vec<AddNodesResult>,
}

#[derive(Debug, Clone)]
pub struct AddReferencesResponse {
    pub service_result: ua::StatusCode,
    pub results: Vec<ua::StatusCode>,
}

#[derive(Debug, Clone)]
pub struct DeleteNodesResponse {
    pub service_result: ua::StatusCode,
    pub results: Vec<ua::StatusCode>,
}

#[derive(Debug, Clone)]
pub struct DeleteReferencesResponse {
    pub service_result: ua::StatusCode,
    pub results: Vec<ua::StatusCode>,
}

#[derive(Debug, Clone)]
pub struct BrowseResponse {
    pub service_result: ua::StatusCode,
    pub results: Vec<BrowseResult>,
}

/// A channel capable of issuing the service calls this core depends on.
///
/// Implemented by whatever owns the secure channel and session; this core
/// only ever calls through it, synchronously, from a single thread (spec
/// §5 "Concurrency model").
pub trait Transport {
    /// Issues `service` and blocks for its response.
    ///
    /// # Errors
    ///
    /// Returns an error if the call could not be delivered at all (e.g. the
    /// channel is closed). A delivered-but-unsuccessful service still
    /// returns `Ok`, with the failure carried in the response's own
    /// `service_result`/per-item status codes.
    fn call(&self, service: ServiceCall) -> Result<ServiceResponse>;
}
