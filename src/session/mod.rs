pub mod controller;
pub mod room;
pub mod store;
pub mod types;

pub use controller::{ControllerConfig, END_PROMPT, START_PROMPT, SessionController, TurnOutcome};
pub use room::RoomSession;
pub use store::{HISTORY_KEY, SessionStore};
pub use types::{
    Message, MessageRole, PersistPolicy, RoomId, RoomSnapshot, RoomSummary, SessionState,
};
