// src/ws/dispatcher.rs
//
// Registry of live websocket sessions and the delivery side of the
// notification pipeline. Injected as a service rather than living as a
// module-level singleton so tests can swap in a recording fake.
use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::db::models::notification::{Notification, Recipient};
use crate::db::models::user::Role;

pub type SessionId = Uuid;

/// Where the orchestrator hands off produced notifications. Delivery is
/// fire-and-forget; implementations must never block on a slow client.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: &Notification);
}

struct SessionEntry {
    user_id: i32,
    role: Role,
    tx: mpsc::UnboundedSender<Notification>,
}

/// Live session map. A user may hold several concurrent sessions (multiple
/// tabs); each is tracked under its own session id. Coarse lock: connect,
/// disconnect and delivery are all short and none is latency-critical.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an authenticated session. Idempotent: a repeated
    /// authenticate frame on the same session overwrites the stale entry.
    pub fn register_session(
        &self,
        session_id: SessionId,
        user_id: i32,
        role: Role,
        tx: mpsc::UnboundedSender<Notification>,
    ) {
        let mut sessions = self.sessions.write().expect("session registry poisoned");
        sessions.insert(session_id, SessionEntry { user_id, role, tx });
        tracing::info!(%session_id, user_id, role = role.as_str(), "session registered");
    }

    /// Removes exactly this session, leaving the user's other sessions
    /// untouched. Safe to call redundantly.
    pub fn deregister_session(&self, session_id: SessionId) {
        let mut sessions = self.sessions.write().expect("session registry poisoned");
        if sessions.remove(&session_id).is_some() {
            tracing::info!(%session_id, "session deregistered");
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().expect("session registry poisoned").len()
    }

    /// Best-effort push to every live session of one user. A user with no
    /// live session simply misses the real-time delivery.
    pub fn deliver_to_user(&self, user_id: i32, notification: &Notification) {
        self.push_matching(notification, |entry| entry.user_id == user_id);
    }

    /// Best-effort push to every live session tagged with the role.
    pub fn deliver_to_role(&self, role: Role, notification: &Notification) {
        self.push_matching(notification, |entry| entry.role == role);
    }

    /// Broadcast to every session outside the given role group.
    pub fn deliver_to_all_except_role(&self, role: Role, notification: &Notification) {
        self.push_matching(notification, |entry| entry.role != role);
    }

    fn push_matching(&self, notification: &Notification, matches: impl Fn(&SessionEntry) -> bool) {
        let sessions = self.sessions.read().expect("session registry poisoned");
        let mut delivered = 0usize;
        for entry in sessions.values().filter(|e| matches(e)) {
            // A closed channel means the session task is winding down; the
            // remaining sessions still get their copy.
            if entry.tx.send(notification.clone()).is_ok() {
                delivered += 1;
            }
        }
        tracing::debug!(
            notification_id = %notification.id,
            delivered,
            "notification dispatched"
        );
    }
}

impl NotificationSink for SessionRegistry {
    fn deliver(&self, notification: &Notification) {
        match notification.recipient {
            Recipient::User { user_id } => self.deliver_to_user(user_id, notification),
            Recipient::Role { role } => self.deliver_to_role(role, notification),
            Recipient::AllExceptRole { role } => {
                self.deliver_to_all_except_role(role, notification)
            }
        }
    }
}
