use super::room::RoomSession;
use super::types::{RoomId, RoomSnapshot, RoomSummary};
use crate::error::StoreError;
use crate::persistence::KvBackend;
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Key the whole history document lives under.
pub const HISTORY_KEY: &str = "conversations";
pub const HISTORY_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_MAX_SESSIONS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct HistoryDocument {
    schema_version: u32,
    index: Vec<RoomSummary>,
    sessions: BTreeMap<RoomId, RoomSnapshot>,
}

impl Default for HistoryDocument {
    fn default() -> Self {
        Self {
            schema_version: HISTORY_SCHEMA_VERSION,
            index: Vec::new(),
            sessions: BTreeMap::new(),
        }
    }
}

impl HistoryDocument {
    fn parse(raw: &str) -> Result<Self, StoreError> {
        let document: Self = serde_json::from_str(raw)
            .map_err(|err| StoreError::CorruptPersistedState(err.to_string()))?;
        document.validate()?;
        Ok(document)
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.schema_version != HISTORY_SCHEMA_VERSION {
            return Err(StoreError::CorruptPersistedState(format!(
                "unknown schema_version {} (expected {HISTORY_SCHEMA_VERSION})",
                self.schema_version
            )));
        }

        for (id, snapshot) in &self.sessions {
            if *id != snapshot.id {
                return Err(StoreError::CorruptPersistedState(format!(
                    "snapshot stored under room {id} belongs to room {}",
                    snapshot.id
                )));
            }
            RoomSession::from_snapshot(snapshot.clone())?;
        }

        let mut seen = HashSet::new();
        for entry in &self.index {
            if !seen.insert(entry.id) {
                return Err(StoreError::CorruptPersistedState(format!(
                    "room {} listed twice in history index",
                    entry.id
                )));
            }
            if !self.sessions.contains_key(&entry.id) {
                return Err(StoreError::CorruptPersistedState(format!(
                    "history index references missing room {}",
                    entry.id
                )));
            }
        }
        Ok(())
    }
}

/// Durable room history: a most-recent-first index of summaries plus the
/// snapshot of every indexed room.
pub struct SessionStore {
    backend: Arc<dyn KvBackend>,
    max_sessions: usize,
    write_lock: Mutex<()>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            max_sessions: DEFAULT_MAX_SESSIONS,
            write_lock: Mutex::new(()),
        }
    }

    /// Keep at most `max_sessions` rooms; older ones are evicted on persist.
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    async fn load_document(&self) -> Result<HistoryDocument, StoreError> {
        let raw = self
            .backend
            .get(HISTORY_KEY)
            .await
            .map_err(|err| StoreError::ReadFailure(format!("{err:#}")))?;
        match raw {
            Some(raw) => HistoryDocument::parse(&raw),
            None => Ok(HistoryDocument::default()),
        }
    }

    /// Write `snapshot` and move its room to the front of the index.
    ///
    /// Index position, not the summary timestamp, is what orders history. A
    /// snapshot older than the stored copy of the same session is skipped.
    pub async fn persist(&self, snapshot: RoomSnapshot) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load_document().await?;
        let room_id = snapshot.id;

        if let Some(stored) = document.sessions.get(&room_id)
            && stored.created_at == snapshot.created_at
            && stored.messages.len() > snapshot.messages.len()
        {
            tracing::debug!(
                room_id = %room_id,
                stored = stored.messages.len(),
                offered = snapshot.messages.len(),
                "skipping stale room snapshot"
            );
            return Ok(());
        }

        document.index.retain(|entry| entry.id != room_id);
        document.index.insert(
            0,
            RoomSummary {
                id: room_id,
                title: format!("对话 {}", Local::now().format("%H:%M:%S")),
                timestamp: Utc::now(),
            },
        );
        document.sessions.insert(room_id, snapshot);

        while document.index.len() > self.max_sessions {
            if let Some(evicted) = document.index.pop() {
                document.sessions.remove(&evicted.id);
                tracing::debug!(room_id = %evicted.id, "evicted room from history");
            }
        }

        let serialized = serde_json::to_string(&document)
            .map_err(|err| StoreError::WriteFailure(err.to_string()))?;
        self.backend
            .put(HISTORY_KEY, &serialized)
            .await
            .map_err(|err| StoreError::WriteFailure(format!("{err:#}")))?;

        tracing::debug!(
            room_id = %room_id,
            backend = self.backend.name(),
            rooms = document.index.len(),
            "persisted room history"
        );
        Ok(())
    }

    /// Summaries of every stored room, most recent first.
    pub async fn load_index(&self) -> Result<Vec<RoomSummary>, StoreError> {
        Ok(self.load_document().await?.index)
    }

    pub async fn load_session(&self, id: RoomId) -> Result<Option<RoomSnapshot>, StoreError> {
        Ok(self.load_document().await?.sessions.remove(&id))
    }

    /// Drop all stored history, including a corrupt document.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.backend
            .remove(HISTORY_KEY)
            .await
            .map_err(|err| StoreError::WriteFailure(format!("{err:#}")))?;
        Ok(())
    }
}
