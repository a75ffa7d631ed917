//! Notification delivery pipeline
//!
//! Server side: `intake` validates, resolves, and persists inbound alerts,
//! then publishes them on the `feed`. Client side: a `SessionDispatcher`
//! subscribes to the feed and maintains per-session unread state, invoking
//! local `presentation` when permitted.

pub mod dispatcher;
pub mod feed;
pub mod intake;
pub mod presentation;

pub use dispatcher::{NotifyPermission, SessionDispatcher, SessionState, RECENT_LIMIT};
pub use feed::NotificationFeed;
pub use intake::{ingest_topic, insert_and_publish, AlertPayload, Delivered};
pub use presentation::{plan_for, AlertPlan, AlertPresenter, LogPresenter, TonePlan};
