use crate::matchmaking::{Room, User, UserStatus};
use konekt_core::{GameKind, PeerId, RoomId};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::Instant;
use tracing::{debug, info};

/// Result of a successful pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedRoom {
    pub room_id: RoomId,
    pub users: [PeerId; 2],
}

/// What a removal cleaned up, so the caller can notify the room mate
/// and retry a pairing for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedUser {
    pub game: GameKind,
    /// The vacated room, if the user was in one.
    pub room_id: Option<RoomId>,
    /// The remaining member of that room, now re-queued.
    pub mate: Option<PeerId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shuffled {
    pub room_id: RoomId,
    pub game: GameKind,
    pub mate: Option<(PeerId, GameKind)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub total_users: usize,
    pub waiting_users: usize,
    pub active_rooms: usize,
}

/// In-memory matchmaking state: the user table, the active-room table,
/// and one FIFO queue per game kind. All operations are plain
/// synchronous map/deque mutations; "nothing to do" is a `None`
/// return, never an error.
#[derive(Default)]
pub struct MatchEngine {
    users: HashMap<PeerId, User>,
    rooms: HashMap<RoomId, Room>,
    queues: HashMap<GameKind, VecDeque<PeerId>>,
}

impl MatchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user at the tail of their game's queue. An id that is
    /// already known is overwritten silently; callers are expected not
    /// to double-enqueue.
    pub fn enqueue(&mut self, peer_id: PeerId, user_name: String, game: GameKind) {
        if self.users.contains_key(&peer_id) {
            // Precondition violation; drop the stale entry so the id
            // never sits in two queues at once.
            self.remove_user(peer_id);
        }

        self.users
            .insert(peer_id, User::waiting(peer_id, user_name, game));
        let queue = self.queues.entry(game).or_default();
        queue.push_back(peer_id);
        debug!(%peer_id, %game, queue_len = queue.len(), "user enqueued");
    }

    /// Pop the two oldest waiters of `game` into a fresh room. Strict
    /// FIFO: first-requested pairs with second-requested. Returns
    /// `None` when fewer than two are waiting — a normal outcome.
    pub fn try_pair(&mut self, game: GameKind) -> Option<PairedRoom> {
        let queue = self.queues.get_mut(&game)?;
        if queue.len() < 2 {
            return None;
        }

        let first = queue.pop_front()?;
        let second = queue.pop_front()?;

        let room_id = RoomId::new();
        debug_assert!(!self.rooms.contains_key(&room_id));
        self.rooms.insert(
            room_id,
            Room {
                id: room_id,
                members: [first, second],
                game,
                created_at: Instant::now(),
            },
        );

        for member in [&first, &second] {
            if let Some(user) = self.users.get_mut(member) {
                user.status = UserStatus::InRoom;
                user.room_id = Some(room_id);
            }
        }

        info!(%room_id, user1 = %first, user2 = %second, %game, "room created");
        Some(PairedRoom {
            room_id,
            users: [first, second],
        })
    }

    /// Remove a user entirely, whether they were queued or in a room.
    /// The single cleanup path for both abrupt disconnects and
    /// explicit leaves. Idempotent: an unknown id returns `None`.
    pub fn remove_user(&mut self, peer_id: PeerId) -> Option<RemovedUser> {
        let user = self.users.remove(&peer_id)?;

        if let Some(queue) = self.queues.get_mut(&user.game) {
            queue.retain(|id| *id != peer_id);
        }

        let mut removed = RemovedUser {
            game: user.game,
            room_id: None,
            mate: None,
        };

        if let Some(room_id) = user.room_id
            && let Some(room) = self.rooms.remove(&room_id)
        {
            removed.room_id = Some(room_id);
            removed.mate = room.mate_of(&peer_id);

            if let Some(mate_id) = removed.mate
                && let Some(mate) = self.users.get_mut(&mate_id)
            {
                mate.room_id = None;
                mate.status = UserStatus::Waiting;
                let game = mate.game;
                self.queues.entry(game).or_default().push_back(mate_id);
                debug!(mate = %mate_id, %game, "room mate re-queued");
            }

            info!(%room_id, leaver = %peer_id, "room deleted");
        }

        debug!(%peer_id, "user removed");
        Some(removed)
    }

    /// Break up the caller's room and return both members to the tail
    /// of their queues, shuffler first. Returns `None` if the caller
    /// is unknown or not in a room.
    pub fn shuffle(&mut self, peer_id: PeerId) -> Option<Shuffled> {
        let room_id = self.users.get(&peer_id)?.room_id?;
        let room = self.rooms.remove(&room_id)?;
        let mate_id = room.mate_of(&peer_id);

        let user = self.users.get_mut(&peer_id)?;
        user.room_id = None;
        user.status = UserStatus::Waiting;
        let game = user.game;
        self.queues.entry(game).or_default().push_back(peer_id);

        let mate = mate_id.and_then(|id| {
            let mate = self.users.get_mut(&id)?;
            mate.room_id = None;
            mate.status = UserStatus::Waiting;
            let mate_game = mate.game;
            self.queues.entry(mate_game).or_default().push_back(id);
            Some((id, mate_game))
        });

        info!(%room_id, shuffler = %peer_id, "room deleted for shuffle");
        Some(Shuffled {
            room_id,
            game,
            mate,
        })
    }

    /// O(1) lookup of the other member of the caller's room.
    pub fn room_mate(&self, peer_id: &PeerId) -> Option<PeerId> {
        let room_id = self.users.get(peer_id)?.room_id?;
        self.rooms.get(&room_id)?.mate_of(peer_id)
    }

    pub fn user(&self, peer_id: &PeerId) -> Option<&User> {
        self.users.get(peer_id)
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_users: self.users.len(),
            waiting_users: self.queues.values().map(VecDeque::len).sum(),
            active_rooms: self.rooms.len(),
        }
    }
}
