use crate::error::TransportError;
use crate::BoxFuture;
use crate::session::types::{RoomId, RoomSummary};

/// The remote riddle service, seen from the client.
///
/// Implementations perform I/O only; they never touch local session state.
pub trait ChatTransport: Send + Sync {
    fn name(&self) -> &str;

    /// Post one user turn and return the AI reply text.
    fn send<'a>(
        &'a self,
        room_id: RoomId,
        text: &'a str,
    ) -> BoxFuture<'a, Result<String, TransportError>>;

    /// Rooms known to the remote service, most recent first.
    fn list_rooms(&self) -> BoxFuture<'_, Result<Vec<RoomSummary>, TransportError>>;
}
