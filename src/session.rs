//! Session registry (spec §4.7, C7).
//!
//! The original threads an authenticated `UA_Session` through every service
//! call to carry access rights and per-client state (continuation points,
//! subscriptions). This core's services bypass that entirely and always run
//! with the rights of a single process-wide admin session, obtained through
//! [`admin_session`]. What that session still needs to hold is the
//! bookkeeping that does not belong in [`crate::store::NodeStore`]: bounded
//! `Browse` continuation points and, when subscriptions are in play, the
//! session's live subscription ids.

use std::{collections::VecDeque, sync::OnceLock};

use parking_lot::Mutex;

use crate::{subscription::SubscriptionId, ua::StatusCode, Error, Result};

/// Opaque `Browse` continuation point, as handed back to a client for a
/// follow-up `BrowseNext`. This core does not itself implement paged
/// browsing (spec §1 Non-goals) — the queue exists so a session-aware
/// transport can still be built on top without reworking this module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinuationPoint(pub Vec<u8>);

/// A single client's server-side session state.
///
/// This core has exactly one session, created on first use and reused for
/// the process's lifetime; it is never closed or expired, matching a core
/// that is always accessed locally rather than over a wire.
#[derive(Debug)]
pub struct Session {
    continuation_points: Mutex<VecDeque<ContinuationPoint>>,
    max_continuation_points: usize,
    subscription_ids: Mutex<Vec<SubscriptionId>>,
}

impl Session {
    fn new(max_continuation_points: usize) -> Self {
        Self {
            continuation_points: Mutex::new(VecDeque::new()),
            max_continuation_points,
            subscription_ids: Mutex::new(Vec::new()),
        }
    }

    /// Queues a continuation point for a later `BrowseNext`. Rejects once
    /// the session's bound is reached, mirroring the server's per-session
    /// cap on open `Browse` views.
    pub fn push_continuation_point(&self, point: ContinuationPoint) -> Result<()> {
        let mut points = self.continuation_points.lock();
        if points.len() >= self.max_continuation_points {
            return Err(Error::new(StatusCode::BAD_NO_CONTINUATION_POINTS));
        }
        points.push_back(point);
        Ok(())
    }

    /// Consumes the oldest queued continuation point, if any.
    pub fn pop_continuation_point(&self) -> Option<ContinuationPoint> {
        self.continuation_points.lock().pop_front()
    }

    #[must_use]
    pub fn continuation_point_count(&self) -> usize {
        self.continuation_points.lock().len()
    }

    /// Records that `subscription_id` belongs to this session.
    pub fn register_subscription(&self, subscription_id: SubscriptionId) {
        self.subscription_ids.lock().push(subscription_id);
    }

    /// Forgets `subscription_id`, e.g. once it has been deleted.
    pub fn unregister_subscription(&self, subscription_id: SubscriptionId) {
        self.subscription_ids.lock().retain(|id| *id != subscription_id);
    }

    #[must_use]
    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.subscription_ids.lock().clone()
    }
}

static ADMIN_SESSION: OnceLock<Session> = OnceLock::new();

/// The process-wide admin session: an authenticated context with
/// unrestricted rights, standing in for the wire-level session every real
/// client would otherwise open.
#[must_use]
pub fn admin_session() -> &'static Session {
    ADMIN_SESSION.get_or_init(|| Session::new(5))
}
