use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer identifier of one riddle room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl RoomId {
    /// Upper bound (exclusive) for randomly generated room ids.
    pub const RANDOM_RANGE: u64 = 1_000_000;

    /// Pick a fresh room id the way the start screen does: uniformly in
    /// `[0, 1_000_000)`.
    pub fn random() -> Self {
        use rand::Rng;
        Self(rand::rng().random_range(0..Self::RANDOM_RANGE))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RoomId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    Active,
    Ended,
}

impl SessionState {
    /// The only state this one may move to, if any.
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::Active),
            Self::Active => Some(Self::Ended),
            Self::Ended => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageRole {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub sequence: u64,
}

/// Immutable copy of a room, as handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub state: SessionState,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

/// One entry of the history index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub title: String,
    pub timestamp: DateTime<Utc>,
}

/// When the controller hands snapshots to the store.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PersistPolicy {
    /// Only once the completion marker ends the game.
    #[default]
    OnEnd,
    /// After every resolved turn, including failed ones.
    EveryTurn,
}
