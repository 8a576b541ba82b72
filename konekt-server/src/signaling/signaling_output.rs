use crate::matchmaking::RelaySignal;
use async_trait::async_trait;
use konekt_core::{PeerId, RoomId};

/// Seam between the matchmaker and whatever transport carries the
/// signaling messages. The production implementation is the websocket
/// registry; tests substitute a capturing mock.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Tell a freshly queued user that matchmaking is under way.
    async fn waiting_for_match(&self, peer_id: PeerId);

    /// Notify one member that their room exists. Sent to each member
    /// individually; the member list lets the client derive its
    /// politeness role.
    async fn room_created(&self, peer_id: PeerId, room_id: RoomId, users: [PeerId; 2]);

    /// Tell the remaining member their partner is gone.
    async fn room_mate_left(&self, peer_id: PeerId);

    /// Forward an offer/answer/candidate to its room mate. `from` is
    /// the sender's display name.
    async fn relay(&self, peer_id: PeerId, signal: RelaySignal, from: String);
}
