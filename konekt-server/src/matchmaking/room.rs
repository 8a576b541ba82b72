use konekt_core::{GameKind, PeerId, RoomId};
use std::time::Instant;

/// A pairing of exactly two users. A room exists only while both
/// members are present; it is deleted the instant either one leaves,
/// disconnects, or shuffles.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub members: [PeerId; 2],
    pub game: GameKind,
    pub created_at: Instant,
}

impl Room {
    pub fn mate_of(&self, peer_id: &PeerId) -> Option<PeerId> {
        let [a, b] = self.members;
        if a == *peer_id {
            Some(b)
        } else if b == *peer_id {
            Some(a)
        } else {
            None
        }
    }
}
