use super::types::{Message, MessageRole, RoomId, RoomSnapshot, SessionState};
use crate::error::{SessionError, StoreError};
use chrono::{DateTime, Utc};

/// One room's ordered message log plus its lifecycle state.
///
/// The log is append-only and sequence numbers start at 1 without gaps.
/// State only ever moves to its immediate successor.
#[derive(Debug, Clone)]
pub struct RoomSession {
    id: RoomId,
    state: SessionState,
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
}

impl RoomSession {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            state: SessionState::NotStarted,
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Rebuild a session from persisted form, checking the log invariants.
    pub fn from_snapshot(snapshot: RoomSnapshot) -> Result<Self, StoreError> {
        for (expected, message) in (1u64..).zip(&snapshot.messages) {
            if message.sequence != expected {
                return Err(StoreError::CorruptPersistedState(format!(
                    "room {}: message has sequence {}, expected {expected}",
                    snapshot.id, message.sequence
                )));
            }
        }
        Ok(Self {
            id: snapshot.id,
            state: snapshot.state,
            messages: snapshot.messages,
            created_at: snapshot.created_at,
        })
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Sequence the next appended message will receive.
    pub fn next_sequence(&self) -> u64 {
        self.messages.last().map_or(1, |m| m.sequence + 1)
    }

    /// Append a message and return its sequence number.
    pub fn append(
        &mut self,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Result<u64, SessionError> {
        if self.state == SessionState::Ended {
            return Err(SessionError::InvalidTransition {
                from: SessionState::Ended,
                to: SessionState::Ended,
            });
        }
        let sequence = self.next_sequence();
        self.messages.push(Message {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            sequence,
        });
        Ok(sequence)
    }

    /// Apply a message produced elsewhere. Anything but the next expected
    /// sequence is a duplicate or arrived out of order, and is dropped.
    pub fn accept(&mut self, message: Message) -> Result<bool, SessionError> {
        if self.state == SessionState::Ended {
            return Err(SessionError::InvalidTransition {
                from: SessionState::Ended,
                to: SessionState::Ended,
            });
        }
        if message.sequence != self.next_sequence() {
            tracing::debug!(
                room_id = %self.id,
                sequence = message.sequence,
                expected = self.next_sequence(),
                "discarding out-of-order message"
            );
            return Ok(false);
        }
        self.messages.push(message);
        Ok(true)
    }

    pub fn transition(&mut self, next: SessionState) -> Result<(), SessionError> {
        if self.state.successor() != Some(next) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(room_id = %self.id, from = %self.state, to = %next, "room transition");
        self.state = next;
        Ok(())
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id,
            state: self.state,
            messages: self.messages.clone(),
            created_at: self.created_at,
        }
    }
}
