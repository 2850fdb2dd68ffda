// src/dialogue/store.rs — In-memory session store keyed by user id
//
// Individual operations are atomic. A whole read-compute-write turn for one
// user is serialized by holding the guard returned from `lock_user`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::OwnedMutexGuard;

use super::session::Session;

#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    turn_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing session, or a fresh IDLE one that is stored before returning.
    pub fn get_or_create(&self, user_id: &str) -> Session {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Session::new(user_id))
            .clone()
    }

    pub fn get(&self, user_id: &str) -> Option<Session> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(user_id)
            .cloned()
    }

    /// Replace the stored session wholesale.
    pub fn update(&self, user_id: &str, session: Session) {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user_id.to_string(), session);
    }

    pub fn clear(&self, user_id: &str) -> Option<Session> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(user_id)
    }

    /// Wait for exclusive use of `user_id` for one full turn.
    pub async fn lock_user(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.turn_locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drop sessions idle for longer than `max_idle`. Returns how many went.
    pub fn evict_idle(&self, max_idle: chrono::Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        sessions.retain(|_, s| s.last_active >= cutoff);
        let evicted = before - sessions.len();

        let mut locks = self.turn_locks.lock().unwrap_or_else(|e| e.into_inner());
        // a strong count above one means a turn is holding or waiting
        locks.retain(|user_id, lock| sessions.contains_key(user_id) || Arc::strong_count(lock) > 1);

        if evicted > 0 {
            tracing::debug!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
