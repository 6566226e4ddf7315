//! Client/server configuration (spec §6.4, ambient).
//!
//! Mirrors the teacher's `ClientConfig`/`ServerConfig` split: small,
//! `Default`-able value structs threaded into the pieces that need them
//! rather than a single God object.

use std::time::Duration;

/// Tunables for [`crate::subscription::Client`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientConfig {
    /// Soft deadline for [`crate::subscription::Client::manually_send_publish_request`]'s
    /// request loop (spec §4.6 "Publish loop").
    pub publish_timeout: Duration,
    /// Sampling interval used by monitored items created through the
    /// event-only builder, which does not take one explicitly.
    pub default_sampling_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            publish_timeout: Duration::from_secs(10),
            default_sampling_interval: Duration::from_millis(250),
        }
    }
}

/// Tunables for the server-side address-space core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Number of namespaces the store is created with (spec §4.1); grows as
    /// namespaces are registered at runtime via `NodeStore::add_namespace`.
    pub namespace_count: u16,
    /// Bound on a session's continuation point queue (spec §4.7).
    pub max_continuation_points: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            namespace_count: 1,
            max_continuation_points: 5,
        }
    }
}
