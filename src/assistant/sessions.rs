use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::conversation::Conversation;
use crate::error::AppError;

/// A conversation shared between the store and the request holding it.
/// The async mutex serializes turns of the same session.
pub type SharedConversation = Arc<Mutex<Conversation>>;

struct SessionEntry {
    conversation: SharedConversation,
    last_used: Instant,
}

/// Live chat sessions keyed by id
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, SessionEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            SessionEntry {
                conversation: Arc::new(Mutex::new(Conversation::new())),
                last_used: Instant::now(),
            },
        );

        crate::metrics::update_session_count(self.sessions.len());
        tracing::debug!(session_id = %id, "Chat session created");
        id
    }

    /// Look up a session and mark it as used
    pub fn get(&self, id: &str) -> Result<SharedConversation, AppError> {
        let key = parse_id(id)?;
        let mut entry = self
            .sessions
            .get_mut(&key)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;

        entry.last_used = Instant::now();
        Ok(entry.conversation.clone())
    }

    pub fn remove(&self, id: &str) -> Result<(), AppError> {
        let key = parse_id(id)?;
        self.sessions
            .remove(&key)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;

        crate::metrics::update_session_count(self.sessions.len());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions unused for at least `max_idle`; returns how many were dropped
    pub fn evict_idle(&self, now: Instant, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.saturating_duration_since(entry.last_used) < max_idle);

        let count = self.sessions.len();
        crate::metrics::update_session_count(count);
        before.saturating_sub(count)
    }

    /// Periodically evict idle sessions (background task)
    pub async fn cleanup_loop(self: Arc<Self>, max_idle: Duration) {
        let period = (max_idle / 4).clamp(Duration::from_secs(1), Duration::from_secs(300));
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;

            let evicted = self.evict_idle(Instant::now(), max_idle);
            tracing::debug!(
                evicted,
                active_sessions = self.sessions.len(),
                "Session cleanup completed"
            );
        }
    }
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::SessionNotFound(id.to_string()))
}
