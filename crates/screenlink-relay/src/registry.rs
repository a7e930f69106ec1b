//! Session registry: maps session IDs to per-session state.
//!
//! Each session sits behind its own mutex, so traffic in one session never
//! waits on another. Lock order is always map, then session.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::session::Session;

pub type SessionHandle = Arc<Mutex<Session>>;

/// Point-in-time view of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: String,
    pub agent_connected: bool,
    pub viewers: usize,
}

/// Thread-safe session registry.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a session, creating an empty one if absent.
    ///
    /// The handle may be evicted before the caller locks it; callers that
    /// attach must check [`Session::is_evicted`] and retry.
    pub async fn get_or_create(&self, session_id: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().await.get(session_id) {
            return Arc::clone(handle);
        }

        let mut map = self.sessions.write().await;
        let handle = map.entry(session_id.to_string()).or_insert_with(|| {
            tracing::debug!(session = %session_id, "Session created");
            Arc::new(Mutex::new(Session::new(session_id)))
        });
        Arc::clone(handle)
    }

    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Remove the session iff it has no agent and no viewers.
    /// Returns true if it was removed.
    pub async fn evict_if_empty(&self, session_id: &str) -> bool {
        let mut map = self.sessions.write().await;
        let Some(handle) = map.get(session_id).cloned() else {
            return false;
        };

        let mut session = handle.lock().await;
        if !session.is_empty() {
            return false;
        }
        session.mark_evicted();
        map.remove(session_id);
        tracing::info!(
            session = %session_id,
            age_secs = session.created_at().elapsed().as_secs(),
            idle_secs = session.last_activity().elapsed().as_secs(),
            "Session evicted"
        );
        true
    }

    /// Check if a session exists.
    pub async fn exists(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Summaries of all live sessions, sorted by id.
    pub async fn snapshot(&self) -> Vec<SessionSummary> {
        let handles: Vec<SessionHandle> = self.sessions.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let session = handle.lock().await;
            if session.is_evicted() {
                continue;
            }
            summaries.push(SessionSummary {
                id: session.id().to_string(),
                agent_connected: session.agent_connected(),
                viewers: session.viewer_count(),
            });
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// Drop the map entry without touching the session.
    #[cfg(test)]
    pub(crate) async fn forget(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }
}
