//! Bounded in-memory session store with idle expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use launchpad_pipeline::RecalibrationController;
use tokio::sync::RwLock;
use uuid::Uuid;

struct SessionEntry {
    controller: Arc<RecalibrationController>,
    last_seen: Instant,
}

/// Returned by [`SessionStore::insert`] when the store is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreFull;

pub struct SessionStore {
    max_sessions: usize,
    idle_ttl: Duration,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(max_sessions: usize, idle_ttl: Duration) -> Self {
        Self {
            max_sessions,
            idle_ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn has_capacity(&self) -> bool {
        self.len().await < self.max_sessions
    }

    /// Adds a session unless the store is full.
    ///
    /// # Errors
    ///
    /// Returns [`StoreFull`] when `max_sessions` are already open.
    pub async fn insert(
        &self,
        id: Uuid,
        controller: Arc<RecalibrationController>,
    ) -> Result<(), StoreFull> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            return Err(StoreFull);
        }
        sessions.insert(
            id,
            SessionEntry {
                controller,
                last_seen: Instant::now(),
            },
        );
        Ok(())
    }

    /// Looks up a session and marks it as used.
    pub async fn get(&self, id: &Uuid) -> Option<Arc<RecalibrationController>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.controller))
    }

    pub async fn remove(&self, id: &Uuid) -> Option<Arc<RecalibrationController>> {
        let entry = self.sessions.write().await.remove(id)?;
        entry.controller.shutdown();
        Some(entry.controller)
    }

    /// Drops every session idle for longer than the TTL as of `now`.
    /// Returns how many were removed.
    pub async fn sweep_idle(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let alive = now.saturating_duration_since(entry.last_seen) <= self.idle_ttl;
            if !alive {
                entry.controller.shutdown();
                tracing::info!(session_id = %id, "idle session expired");
            }
            alive
        });
        before - sessions.len()
    }
}

/// Periodically expires idle sessions. Runs until the task is dropped.
pub async fn run_idle_sweep(store: Arc<SessionStore>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let removed = store.sweep_idle(Instant::now()).await;
        if removed > 0 {
            tracing::debug!(removed, "idle sweep finished");
        }
    }
}
