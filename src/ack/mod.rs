//! Acknowledgment lifecycle
//!
//! Converts delivered notifications into a read state. Each attempt is a
//! command over a pre-state snapshot: the local mutation is applied
//! optimistically, committed through a primary update path with a direct
//! store fallback, and compensated (exact pre-attempt state restored) only
//! when both paths fail. The unread-to-acknowledged transition is
//! monotonic and terminal.

pub mod http;

pub use http::HttpAckChannel;

use async_trait::async_trait;
use dashmap::DashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::db::AlertStore;
use crate::delivery::dispatcher::SessionState;
use crate::types::{HeraldError, Result};

/// Typed outcome of an acknowledgment attempt. Failure of both commit
/// paths surfaces as the error arm, after rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Committed through the primary update path
    Applied,
    /// Primary path reported failure; the direct store mutation succeeded
    FallbackApplied,
    /// The id was already acknowledged: successful no-op
    AlreadyAcknowledged,
    /// An attempt for this id was already in flight: request dropped
    Dropped,
}

/// One commit path for acknowledgment updates.
///
/// `Ok(false)` means the path responded but reported non-success; `Err`
/// means the path itself failed. Either triggers the fallback.
#[async_trait]
pub trait AckChannel: Send + Sync {
    async fn acknowledge(&self, id: &str) -> Result<bool>;
    async fn acknowledge_all(&self) -> Result<bool>;
}

/// Direct store mutation channel, used as the fallback path
pub struct StoreAckChannel {
    store: Arc<dyn AlertStore>,
}

impl StoreAckChannel {
    pub fn new(store: Arc<dyn AlertStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AckChannel for StoreAckChannel {
    async fn acknowledge(&self, id: &str) -> Result<bool> {
        // An unknown id is not a failure: the transition is idempotent
        self.store.set_acknowledged(id).await?;
        Ok(true)
    }

    async fn acknowledge_all(&self) -> Result<bool> {
        self.store.acknowledge_all().await?;
        Ok(true)
    }
}

/// Tracks acknowledgments for one client session
pub struct AckTracker {
    state: Arc<Mutex<SessionState>>,
    primary: Arc<dyn AckChannel>,
    fallback: Arc<dyn AckChannel>,
    in_flight: DashSet<String>,
}

impl AckTracker {
    pub fn new(
        state: Arc<Mutex<SessionState>>,
        primary: Arc<dyn AckChannel>,
        fallback: Arc<dyn AckChannel>,
    ) -> Self {
        Self {
            state,
            primary,
            fallback,
            in_flight: DashSet::new(),
        }
    }

    /// Acknowledge one notification.
    ///
    /// Idempotent per id; a request for an id with an attempt already in
    /// flight is dropped, not queued.
    pub async fn acknowledge(&self, id: &str) -> Result<AckOutcome> {
        if !self.in_flight.insert(id.to_string()) {
            debug!(id = id, "acknowledge dropped: attempt already in flight");
            return Ok(AckOutcome::Dropped);
        }

        let result = self.acknowledge_guarded(id).await;
        self.in_flight.remove(id);
        result
    }

    async fn acknowledge_guarded(&self, id: &str) -> Result<AckOutcome> {
        // Snapshot and optimistic apply in one atomic step
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            let snapshot = state.ack_snapshot(id);
            if snapshot.acknowledged == Some(true) {
                return Ok(AckOutcome::AlreadyAcknowledged);
            }
            state.apply_ack(id);
            snapshot
        };

        match self.primary.acknowledge(id).await {
            Ok(true) => Ok(AckOutcome::Applied),
            primary_result => {
                if let Err(e) = &primary_result {
                    warn!(id = id, "primary acknowledge path failed: {}", e);
                }
                match self.fallback.acknowledge(id).await {
                    Ok(true) => Ok(AckOutcome::FallbackApplied),
                    Ok(false) => {
                        self.state.lock().unwrap().restore_ack(id, snapshot);
                        Err(HeraldError::Store(
                            "acknowledge rejected by primary and fallback paths".into(),
                        ))
                    }
                    Err(e) => {
                        self.state.lock().unwrap().restore_ack(id, snapshot);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Acknowledge every unacknowledged notification; the local unread
    /// counter resets to zero unconditionally.
    pub async fn acknowledge_all(&self) -> Result<AckOutcome> {
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            let snapshot = state.bulk_snapshot();
            state.apply_ack_all();
            snapshot
        };

        match self.primary.acknowledge_all().await {
            Ok(true) => Ok(AckOutcome::Applied),
            primary_result => {
                if let Err(e) = &primary_result {
                    warn!("primary acknowledge-all path failed: {}", e);
                }
                match self.fallback.acknowledge_all().await {
                    Ok(true) => Ok(AckOutcome::FallbackApplied),
                    Ok(false) => {
                        self.state.lock().unwrap().restore_bulk(snapshot);
                        Err(HeraldError::Store(
                            "acknowledge-all rejected by primary and fallback paths".into(),
                        ))
                    }
                    Err(e) => {
                        self.state.lock().unwrap().restore_bulk(snapshot);
                        Err(e)
                    }
                }
            }
        }
    }
}
