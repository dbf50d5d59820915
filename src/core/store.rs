//! In-memory registry of live browser sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::models::ModelRegistry;
use crate::core::session::Session;

pub type SessionId = Uuid;
pub type SessionHandle = Arc<Mutex<Session>>;

struct Entry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// Sessions keyed by the id carried in the browser cookie. Each session has
/// its own lock so one slow reply never blocks other sessions.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Entry>>>,
    registry: Arc<ModelRegistry>,
    system_prompt: Arc<str>,
}

impl SessionStore {
    pub fn new(registry: Arc<ModelRegistry>, system_prompt: impl Into<Arc<str>>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            registry,
            system_prompt: system_prompt.into(),
        }
    }

    /// Return the session for `id`, creating a fresh one when the id is
    /// missing or unknown. The returned flag is true for new sessions.
    pub async fn get_or_create(&self, id: Option<SessionId>) -> (SessionId, SessionHandle, bool) {
        let mut sessions = self.sessions.write().await;
        if let Some(id) = id {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = Instant::now();
                return (id, Arc::clone(&entry.handle), false);
            }
        }

        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(Session::bootstrap(
            &self.registry,
            &self.system_prompt,
        )));
        sessions.insert(
            id,
            Entry {
                handle: Arc::clone(&handle),
                last_seen: Instant::now(),
            },
        );
        debug!(session = %id, "session created");
        (id, handle, true)
    }

    /// Look up an existing session without creating one.
    pub async fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.handle))
    }

    /// Drop sessions unused for at least `max_idle`. Sessions still held by a
    /// request are kept. Returns how many were removed.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = Arc::strong_count(&entry.handle) > 1
                || now.duration_since(entry.last_seen) < max_idle;
            if !keep {
                debug!(session = %id, "session evicted");
            }
            keep
        });
        before - sessions.len()
    }

    /// Run [`Self::evict_idle`] every `every` until the task is aborted.
    pub fn spawn_reaper(&self, every: Duration, max_idle: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle(max_idle).await;
                if evicted > 0 {
                    let remaining = store.len().await;
                    info!(evicted, remaining, "idle sessions evicted");
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
