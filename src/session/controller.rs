use super::room::RoomSession;
use super::store::SessionStore;
use super::types::{
    Message, MessageRole, PersistPolicy, RoomId, RoomSnapshot, RoomSummary, SessionState,
};
use crate::error::{SessionError, StoreError, TransportError};
use crate::transport::ChatTransport;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Turn text that asks the host to start a game.
pub const START_PROMPT: &str = "开始";
/// Turn text that asks the host to end the game.
pub const END_PROMPT: &str = "结束";

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Substring of an AI reply that means the game is over.
    pub completion_marker: String,
    /// Synthetic AI message appended when a turn cannot be delivered.
    pub failure_message: String,
    pub persist_policy: PersistPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            completion_marker: "游戏已结束".into(),
            failure_message: "抱歉，发送消息失败，请重试".into(),
            persist_policy: PersistPolicy::OnEnd,
        }
    }
}

/// What happened to a submitted turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The host answered; `ended` is set when the answer finished the game.
    Replied { reply: String, ended: bool },
    /// Delivery failed; a synthetic error message was appended instead.
    Failed { error: String },
    /// The room was abandoned while the call was in flight.
    Discarded,
}

struct RoomSlot {
    session: RoomSession,
    in_flight: bool,
    generation: u64,
}

/// Orchestrates turns for every open room.
///
/// Each room has at most one turn in flight. Rooms never share state, so
/// turns for different rooms run concurrently; the room table lock is never
/// held across an await.
pub struct SessionController {
    transport: Arc<dyn ChatTransport>,
    store: Arc<SessionStore>,
    config: ControllerConfig,
    rooms: Mutex<HashMap<RoomId, RoomSlot>>,
    next_generation: AtomicU64,
}

/// Clears the in-flight flag if a submitting future is dropped mid-call.
struct InFlightGuard<'a> {
    controller: &'a SessionController,
    room_id: RoomId,
    generation: u64,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut rooms = self.controller.lock_rooms();
        if let Some(slot) = rooms.get_mut(&self.room_id)
            && slot.generation == self.generation
        {
            slot.in_flight = false;
            tracing::debug!(room_id = %self.room_id, "turn cancelled before completion");
        }
    }
}

impl SessionController {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        store: Arc<SessionStore>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            transport,
            store,
            config,
            rooms: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        self.store.as_ref()
    }

    fn lock_rooms(&self) -> MutexGuard<'_, HashMap<RoomId, RoomSlot>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert_slot(&self, session: RoomSession) -> SessionState {
        let state = session.state();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.lock_rooms().insert(
            session.id(),
            RoomSlot {
                session,
                in_flight: false,
                generation,
            },
        );
        state
    }

    /// Open `room_id` if it is not open yet and return its state.
    pub fn open_room(&self, room_id: RoomId) -> SessionState {
        if let Some(slot) = self.lock_rooms().get(&room_id) {
            return slot.session.state();
        }
        tracing::info!(room_id = %room_id, "opened room");
        self.insert_slot(RoomSession::new(room_id))
    }

    /// Open a room under a fresh random id.
    pub fn start_room(&self) -> RoomId {
        loop {
            let candidate = RoomId::random();
            let taken = self.lock_rooms().contains_key(&candidate);
            if !taken {
                self.open_room(candidate);
                return candidate;
            }
        }
    }

    /// Reopen a room from stored history. Returns `None` when the store has
    /// no snapshot for it.
    pub async fn resume_room(&self, room_id: RoomId) -> Result<Option<SessionState>, StoreError> {
        if let Some(slot) = self.lock_rooms().get(&room_id) {
            return Ok(Some(slot.session.state()));
        }
        let Some(snapshot) = self.store.load_session(room_id).await? else {
            return Ok(None);
        };
        let session = RoomSession::from_snapshot(snapshot)?;
        tracing::info!(
            room_id = %room_id,
            messages = session.messages().len(),
            "resumed room from history"
        );
        Ok(Some(self.insert_slot(session)))
    }

    /// Forget a room. A turn still in flight for it completes, but its
    /// result is dropped.
    pub fn abandon_room(&self, room_id: RoomId) -> bool {
        let removed = self.lock_rooms().remove(&room_id).is_some();
        if removed {
            tracing::info!(room_id = %room_id, "abandoned room");
        }
        removed
    }

    pub fn state(&self, room_id: RoomId) -> Option<SessionState> {
        self.lock_rooms()
            .get(&room_id)
            .map(|slot| slot.session.state())
    }

    pub fn messages(&self, room_id: RoomId) -> Option<Vec<Message>> {
        self.lock_rooms()
            .get(&room_id)
            .map(|slot| slot.session.messages().to_vec())
    }

    pub fn snapshot(&self, room_id: RoomId) -> Option<RoomSnapshot> {
        self.lock_rooms()
            .get(&room_id)
            .map(|slot| slot.session.snapshot())
    }

    pub fn is_in_flight(&self, room_id: RoomId) -> bool {
        self.lock_rooms()
            .get(&room_id)
            .is_some_and(|slot| slot.in_flight)
    }

    /// Send the opening turn. A game can be started only once; a failed
    /// opening turn leaves the room startable.
    pub async fn start_game(&self, room_id: RoomId) -> Result<TurnOutcome, SessionError> {
        match self.state(room_id) {
            None => return Err(SessionError::RoomNotFound(room_id)),
            Some(SessionState::NotStarted) => {}
            Some(from) => {
                return Err(SessionError::InvalidTransition {
                    from,
                    to: SessionState::Active,
                });
            }
        }
        self.submit_turn(room_id, START_PROMPT).await
    }

    /// Send the closing turn. Only a started game can be ended.
    pub async fn end_game(&self, room_id: RoomId) -> Result<TurnOutcome, SessionError> {
        match self.state(room_id) {
            None => return Err(SessionError::RoomNotFound(room_id)),
            Some(SessionState::Active) => {}
            Some(from) => {
                return Err(SessionError::InvalidTransition {
                    from,
                    to: SessionState::Ended,
                });
            }
        }
        self.submit_turn(room_id, END_PROMPT).await
    }

    /// Submit one user turn and reconcile the room with the result.
    ///
    /// The user message is appended before the call and is kept even when
    /// delivery fails. Transport failures never escape as errors; they
    /// become a synthetic AI message and `TurnOutcome::Failed`.
    pub async fn submit_turn(
        &self,
        room_id: RoomId,
        text: &str,
    ) -> Result<TurnOutcome, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let (generation, user_sequence) = {
            let mut rooms = self.lock_rooms();
            let slot = rooms
                .get_mut(&room_id)
                .ok_or(SessionError::RoomNotFound(room_id))?;
            if slot.in_flight {
                return Err(SessionError::TurnInProgress(room_id));
            }
            let sequence = slot.session.append(MessageRole::User, text)?;
            slot.in_flight = true;
            (slot.generation, sequence)
        };

        let mut guard = InFlightGuard {
            controller: self,
            room_id,
            generation,
            armed: true,
        };

        tracing::debug!(room_id = %room_id, sequence = user_sequence, "submitting turn");
        let result = self.transport.send(room_id, text).await;

        let (outcome, to_persist) = {
            let mut rooms = self.lock_rooms();
            guard.disarm();
            let Some(slot) = rooms
                .get_mut(&room_id)
                .filter(|slot| slot.generation == generation)
            else {
                tracing::info!(room_id = %room_id, "discarding reply for abandoned room");
                return Ok(TurnOutcome::Discarded);
            };
            slot.in_flight = false;
            self.reconcile(&mut slot.session, user_sequence, result)?
        };

        if let Some(snapshot) = to_persist {
            self.persist(snapshot).await;
        }
        Ok(outcome)
    }

    fn reconcile(
        &self,
        session: &mut RoomSession,
        user_sequence: u64,
        result: Result<String, TransportError>,
    ) -> Result<(TurnOutcome, Option<RoomSnapshot>), SessionError> {
        let every_turn = self.config.persist_policy == PersistPolicy::EveryTurn;

        match result {
            Ok(reply) => {
                let accepted = session.accept(Message {
                    role: MessageRole::Ai,
                    content: reply.clone(),
                    timestamp: Utc::now(),
                    sequence: user_sequence + 1,
                })?;
                if !accepted {
                    return Ok((TurnOutcome::Discarded, None));
                }
                if session.state() == SessionState::NotStarted {
                    session.transition(SessionState::Active)?;
                }
                let ended = reply.contains(&self.config.completion_marker);
                if ended {
                    session.transition(SessionState::Ended)?;
                    tracing::info!(room_id = %session.id(), "game ended");
                }
                let snapshot = (ended || every_turn).then(|| session.snapshot());
                Ok((TurnOutcome::Replied { reply, ended }, snapshot))
            }
            Err(err) => {
                tracing::warn!(room_id = %session.id(), "Turn delivery failed: {err}");
                session.append(MessageRole::Ai, self.config.failure_message.clone())?;
                let snapshot = every_turn.then(|| session.snapshot());
                Ok((
                    TurnOutcome::Failed {
                        error: err.to_string(),
                    },
                    snapshot,
                ))
            }
        }
    }

    async fn persist(&self, snapshot: RoomSnapshot) {
        let room_id = snapshot.id;
        if let Err(err) = self.store.persist(snapshot).await {
            tracing::warn!(room_id = %room_id, "History not saved (non-fatal): {err}");
        }
    }

    /// Locally stored rooms, most recent first.
    pub async fn history(&self) -> Result<Vec<RoomSummary>, StoreError> {
        self.store.load_index().await
    }

    /// Rooms the remote service knows about.
    pub async fn remote_rooms(&self) -> Result<Vec<RoomSummary>, TransportError> {
        self.transport.list_rooms().await
    }
}
