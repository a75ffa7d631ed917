//! Per-session delivery dispatcher
//!
//! Session-scoped state with a single owner: a bounded recent-list, an
//! unread counter with duplicate-id suppression, and presentation gated on
//! local notification permission. The session holds at most one live feed
//! subscription, managed through an explicit start/stop lifecycle.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::db::schemas::NotificationRecord;
use crate::delivery::feed::NotificationFeed;
use crate::delivery::presentation::{plan_for, AlertPresenter};

/// Bounded recent-list capacity
pub const RECENT_LIMIT: usize = 5;

/// Local notification permission state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPermission {
    Granted,
    Denied,
}

/// Pre-attempt snapshot for a single acknowledgment
#[derive(Debug, Clone, Copy)]
pub struct AckSnapshot {
    /// Prior flag if the notification is in the recent list
    pub acknowledged: Option<bool>,
    pub unread: u32,
}

/// Pre-attempt snapshot for a bulk acknowledgment
#[derive(Debug, Clone)]
pub struct BulkSnapshot {
    flags: Vec<(String, bool)>,
    unread: u32,
}

/// Session-local notification state.
///
/// Single-writer per session: only the dispatcher and the acknowledgment
/// tracker mutate it, each mutation one atomic step under the lock.
#[derive(Default)]
pub struct SessionState {
    recent: VecDeque<NotificationRecord>,
    unread: u32,
    seen: HashSet<String>,
}

impl SessionState {
    /// Record an arriving creation event. Returns whether the id was
    /// never seen before (the unread counter moved).
    fn absorb(&mut self, record: NotificationRecord) -> bool {
        let fresh = self.seen.insert(record.id.clone());

        self.recent.push_front(record);
        self.recent.truncate(RECENT_LIMIT);

        if fresh {
            self.unread += 1;
        }
        fresh
    }

    /// Seed state from an initial load of stored notifications,
    /// newest-first.
    pub fn prime(&mut self, records: Vec<NotificationRecord>) {
        self.unread = records.iter().filter(|r| !r.acknowledged).count() as u32;
        self.seen = records.iter().map(|r| r.id.clone()).collect();
        self.recent = records.into_iter().take(RECENT_LIMIT).collect();
    }

    pub fn unread(&self) -> u32 {
        self.unread
    }

    pub fn recent(&self) -> Vec<NotificationRecord> {
        self.recent.iter().cloned().collect()
    }

    /// Snapshot the state an acknowledgment of `id` would mutate
    pub fn ack_snapshot(&self, id: &str) -> AckSnapshot {
        AckSnapshot {
            acknowledged: self.recent.iter().find(|n| n.id == id).map(|n| n.acknowledged),
            unread: self.unread,
        }
    }

    /// Optimistically mark one notification acknowledged
    pub fn apply_ack(&mut self, id: &str) {
        for n in self.recent.iter_mut().filter(|n| n.id == id) {
            n.acknowledged = true;
        }
        self.unread = self.unread.saturating_sub(1);
    }

    /// Restore the exact pre-attempt state after a failed acknowledgment
    pub fn restore_ack(&mut self, id: &str, snapshot: AckSnapshot) {
        if let Some(prior) = snapshot.acknowledged {
            for n in self.recent.iter_mut().filter(|n| n.id == id) {
                n.acknowledged = prior;
            }
        }
        self.unread = snapshot.unread;
    }

    /// Snapshot every acknowledged flag plus the unread counter
    pub fn bulk_snapshot(&self) -> BulkSnapshot {
        BulkSnapshot {
            flags: self
                .recent
                .iter()
                .map(|n| (n.id.clone(), n.acknowledged))
                .collect(),
            unread: self.unread,
        }
    }

    /// Optimistically mark everything acknowledged, counter to zero
    pub fn apply_ack_all(&mut self) {
        for n in self.recent.iter_mut() {
            n.acknowledged = true;
        }
        self.unread = 0;
    }

    /// Restore after a failed bulk acknowledgment
    pub fn restore_bulk(&mut self, snapshot: BulkSnapshot) {
        for (id, prior) in snapshot.flags {
            if let Some(n) = self.recent.iter_mut().find(|n| n.id == id) {
                n.acknowledged = prior;
            }
        }
        self.unread = snapshot.unread;
    }
}

/// Fan-out endpoint for one client session
pub struct SessionDispatcher {
    state: Arc<Mutex<SessionState>>,
    permission: NotifyPermission,
    presenter: Option<Arc<dyn AlertPresenter>>,
    subscription: Mutex<Option<JoinHandle<()>>>,
}

impl SessionDispatcher {
    pub fn new(
        permission: NotifyPermission,
        presenter: Option<Arc<dyn AlertPresenter>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            permission,
            presenter,
            subscription: Mutex::new(None),
        })
    }

    /// Shared handle to the session state, for the acknowledgment tracker
    pub fn state(&self) -> Arc<Mutex<SessionState>> {
        Arc::clone(&self.state)
    }

    pub fn unread(&self) -> u32 {
        self.state.lock().unwrap().unread()
    }

    pub fn recent(&self) -> Vec<NotificationRecord> {
        self.state.lock().unwrap().recent()
    }

    /// Seed the session from an initial load, newest-first
    pub fn prime(&self, records: Vec<NotificationRecord>) {
        self.state.lock().unwrap().prime(records);
    }

    /// Handle one arriving creation event.
    ///
    /// The list/counter update is a single atomic step; presentation runs
    /// after it and its failures are logged, never propagated.
    pub fn deliver(&self, record: NotificationRecord) {
        let presented = record.clone();
        let fresh = self.state.lock().unwrap().absorb(record);

        if !fresh {
            debug!(id = %presented.id, "duplicate delivery suppressed from unread count");
        }

        if self.permission == NotifyPermission::Granted {
            if let Some(presenter) = &self.presenter {
                let plan = plan_for(presented.priority);
                if let Err(e) = presenter.present(&presented, &plan) {
                    warn!(id = %presented.id, "presentation failed: {}", e);
                }
            }
        }
    }

    /// Subscribe this session to the feed.
    ///
    /// Exactly one live subscription per session: an existing subscription
    /// is stopped before the new one starts.
    pub fn start(self: &Arc<Self>, feed: &NotificationFeed) {
        let mut guard = self.subscription.lock().unwrap();
        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let mut rx = feed.subscribe();
        let dispatcher = Arc::clone(self);
        *guard = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(record) => dispatcher.deliver(record),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("session feed lagged, {} events dropped", skipped);
                    }
                }
            }
        }));
    }

    /// Drop the live feed subscription, if any
    pub fn stop(&self) {
        if let Some(handle) = self.subscription.lock().unwrap().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::Priority;
    use crate::types::HeraldError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(id: &str, priority: Priority) -> NotificationRecord {
        NotificationRecord {
            id: id.to_string(),
            title: format!("alert {}", id),
            body: "body".to_string(),
            kind: "alerts".to_string(),
            priority,
            metadata: serde_json::Map::new(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            acknowledged: false,
        }
    }

    struct CountingPresenter(AtomicUsize);

    impl AlertPresenter for CountingPresenter {
        fn present(
            &self,
            _record: &NotificationRecord,
            _plan: &crate::delivery::AlertPlan,
        ) -> crate::types::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingPresenter;

    impl AlertPresenter for FailingPresenter {
        fn present(
            &self,
            _record: &NotificationRecord,
            _plan: &crate::delivery::AlertPlan,
        ) -> crate::types::Result<()> {
            Err(HeraldError::Presentation("audio context unavailable".into()))
        }
    }

    #[test]
    fn test_recent_list_bounded_newest_first() {
        let dispatcher = SessionDispatcher::new(NotifyPermission::Denied, None);
        for i in 0..8 {
            dispatcher.deliver(record(&format!("n{}", i), Priority::Medium));
        }

        let recent = dispatcher.recent();
        assert_eq!(recent.len(), RECENT_LIMIT);
        assert_eq!(recent[0].id, "n7");
        assert_eq!(recent[4].id, "n3");
        assert_eq!(dispatcher.unread(), 8);
    }

    #[test]
    fn test_duplicate_id_does_not_double_increment() {
        let dispatcher = SessionDispatcher::new(NotifyPermission::Denied, None);
        dispatcher.deliver(record("n1", Priority::Low));
        dispatcher.deliver(record("n1", Priority::Low));

        assert_eq!(dispatcher.unread(), 1);
    }

    #[test]
    fn test_presentation_failure_never_blocks_state_update() {
        let dispatcher =
            SessionDispatcher::new(NotifyPermission::Granted, Some(Arc::new(FailingPresenter)));
        dispatcher.deliver(record("n1", Priority::High));

        assert_eq!(dispatcher.unread(), 1);
        assert_eq!(dispatcher.recent().len(), 1);
    }

    #[test]
    fn test_permission_denied_skips_presentation() {
        let presenter = Arc::new(CountingPresenter(AtomicUsize::new(0)));
        let dispatcher =
            SessionDispatcher::new(NotifyPermission::Denied, Some(presenter.clone()));
        dispatcher.deliver(record("n1", Priority::Medium));

        assert_eq!(presenter.0.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.unread(), 1);
    }

    #[test]
    fn test_prime_counts_unacknowledged() {
        let dispatcher = SessionDispatcher::new(NotifyPermission::Denied, None);
        let mut records: Vec<NotificationRecord> =
            (0..7).map(|i| record(&format!("n{}", i), Priority::Low)).collect();
        records[0].acknowledged = true;
        records[3].acknowledged = true;

        dispatcher.prime(records);

        assert_eq!(dispatcher.unread(), 5);
        assert_eq!(dispatcher.recent().len(), RECENT_LIMIT);
        // Primed ids are already seen: redelivery must not increment
        dispatcher.deliver(record("n2", Priority::Low));
        assert_eq!(dispatcher.unread(), 5);
    }

    #[tokio::test]
    async fn test_start_twice_keeps_single_subscription() {
        let feed = NotificationFeed::default();
        let presenter = Arc::new(CountingPresenter(AtomicUsize::new(0)));
        let dispatcher =
            SessionDispatcher::new(NotifyPermission::Granted, Some(presenter.clone()));

        dispatcher.start(&feed);
        dispatcher.start(&feed);
        tokio::task::yield_now().await;

        feed.publish(record("n1", Priority::Medium));

        // Let the subscription task drain the event
        for _ in 0..10 {
            tokio::task::yield_now().await;
            if dispatcher.unread() > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        assert_eq!(dispatcher.unread(), 1);
        assert_eq!(presenter.0.load(Ordering::SeqCst), 1);

        dispatcher.stop();
    }
}
