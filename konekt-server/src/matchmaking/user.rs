use konekt_core::{GameKind, PeerId, RoomId};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Waiting,
    InRoom,
}

/// A connected participant. Owned exclusively by the match engine;
/// removed outright on disconnect or leave, never marked inactive.
#[derive(Debug, Clone)]
pub struct User {
    pub id: PeerId,
    pub user_name: String,
    pub status: UserStatus,
    /// Present iff status is `InRoom`.
    pub room_id: Option<RoomId>,
    pub joined_at: Instant,
    pub game: GameKind,
}

impl User {
    pub fn waiting(id: PeerId, user_name: String, game: GameKind) -> Self {
        Self {
            id,
            user_name,
            status: UserStatus::Waiting,
            room_id: None,
            joined_at: Instant::now(),
            game,
        }
    }
}
