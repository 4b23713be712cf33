use crate::session::types::{RoomId, SessionState};
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `riddlechat`.
///
/// Each subsystem defines its own error type. Library callers can match on
/// these to decide recovery strategy; the binary and config plumbing keep
/// using `anyhow::Result` for context chains.
#[derive(Debug, Error)]
pub enum RiddleError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Session lifecycle ───────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Remote service ──────────────────────────────────────────────────
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    // ── Local history ───────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Session errors ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Lifecycle misuse: appending to an ended room, or a transition that
    /// is not the immediate successor of the current state.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: SessionState, to: SessionState },

    #[error("a turn is already in flight for room {0}")]
    TurnInProgress(RoomId),

    #[error("room {0} is not open")]
    RoomNotFound(RoomId),

    #[error("message text is empty")]
    EmptyInput,
}

// ─── Transport errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("gave up after {attempts} attempt(s): {last}")]
    Exhausted {
        attempts: u32,
        last: Box<TransportError>,
    },
}

impl TransportError {
    /// Timeouts, connection failures and 5xx responses may succeed on a
    /// later attempt. Every 4xx and every malformed body is final.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connect(_) => true,
            Self::Status { status, .. } => (500..600).contains(status),
            Self::Malformed(_) | Self::Exhausted { .. } => false,
        }
    }
}

// ─── Store errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage write failed: {0}")]
    WriteFailure(String),

    #[error("storage read failed: {0}")]
    ReadFailure(String),

    #[error("persisted state is corrupt: {0}")]
    CorruptPersistedState(String),
}
