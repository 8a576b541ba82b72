use crate::matchmaking::EngineStats;
use konekt_core::{GameKind, PeerId};
use tokio::sync::oneshot;

/// A negotiation payload relayed 1:1 to the sender's room mate. The
/// matchmaker routes it; it never inspects the contents.
#[derive(Debug, Clone)]
pub enum RelaySignal {
    Offer(String),
    Answer(String),
    Candidate(String),
}

/// Commands delivered to the matchmaker from the signaling sockets.
#[derive(Debug)]
pub enum MatchCommand {
    /// A client asked to be paired.
    Join {
        peer_id: PeerId,
        user_name: String,
        game: GameKind,
    },

    /// Explicit leave-queue request.
    Leave { peer_id: PeerId },

    /// Break up the current room and re-queue both members.
    Shuffle { peer_id: PeerId },

    /// The signaling socket went away. Same cleanup as `Leave`.
    Disconnect { peer_id: PeerId },

    /// Offer/answer/candidate to forward to the room mate.
    Relay {
        peer_id: PeerId,
        signal: RelaySignal,
    },

    /// Observability snapshot.
    Stats { reply: oneshot::Sender<EngineStats> },
}
