//! In-memory registry of open allocation sessions.
//!
//! Each session is touched by one organizer at a time; the registry lock is
//! only held for the duration of a single synchronous engine call.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::allocation::{AllocationError, AllocationSession, SessionSnapshot};

#[derive(Debug)]
pub struct SessionEntry {
    pub session: AllocationSession,
    /// Событие, для которого распределяются места (если известно).
    pub event_id: Option<i64>,
    pub venue_id: Option<i64>,
    pub opened_at: DateTime<Utc>,
    pub touched_at: DateTime<Utc>,
}

impl SessionEntry {
    pub fn new(session: AllocationSession, event_id: Option<i64>, venue_id: Option<i64>) -> Self {
        let now = Utc::now();
        Self {
            session,
            event_id,
            venue_id,
            opened_at: now,
            touched_at: now,
        }
    }
}

impl SessionEntry {
    pub fn persisted(&self) -> PersistedSession {
        PersistedSession {
            event_id: self.event_id,
            venue_id: self.venue_id,
            opened_at: self.opened_at,
            snapshot: self.session.snapshot(),
        }
    }

    pub fn from_persisted(record: PersistedSession) -> Result<Self, AllocationError> {
        let session = AllocationSession::restore(record.snapshot)?;
        Ok(Self {
            session,
            event_id: record.event_id,
            venue_id: record.venue_id,
            opened_at: record.opened_at,
            touched_at: Utc::now(),
        })
    }
}

/// Что кладем в Redis: снапшот движка плюс привязка к событию и площадке.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub event_id: Option<i64>,
    pub venue_id: Option<i64>,
    pub opened_at: DateTime<Utc>,
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, entry: SessionEntry) -> Uuid {
        let id = Uuid::new_v4();
        self.insert_with_id(id, entry).await;
        id
    }

    /// Used when a session comes back from a snapshot under its old id.
    /// A live session under `id` always wins; returns `false` if one was
    /// already there and `entry` was dropped.
    pub async fn insert_with_id(&self, id: Uuid, entry: SessionEntry) -> bool {
        match self.inner.write().await.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.inner.read().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Runs `f` against the session and marks it as recently used.
    pub async fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut SessionEntry) -> R) -> Option<R> {
        let mut sessions = self.inner.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.touched_at = Utc::now();
        Some(f(entry))
    }

    pub async fn read<R>(&self, id: Uuid, f: impl FnOnce(&SessionEntry) -> R) -> Option<R> {
        let sessions = self.inner.read().await;
        sessions.get(&id).map(f)
    }

    pub async fn snapshot(&self, id: Uuid) -> Option<PersistedSession> {
        self.read(id, SessionEntry::persisted).await
    }

    pub async fn remove(&self, id: Uuid) -> Option<SessionEntry> {
        self.inner.write().await.remove(&id)
    }

    /// Drops sessions untouched for longer than `idle`. Returns their ids.
    pub async fn evict_idle(&self, idle: Duration, now: DateTime<Utc>) -> Vec<Uuid> {
        let mut sessions = self.inner.write().await;
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, entry)| now - entry.touched_at > idle)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            if let Some(entry) = sessions.remove(id) {
                info!(
                    "Session {} evicted after {} idle seconds",
                    id,
                    (now - entry.touched_at).num_seconds()
                );
            }
        }
        expired
    }
}
