use konekt_core::GamePacket;
use std::fmt;
use std::sync::Arc;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::track::track_remote::TrackRemote;

/// Lifecycle of a negotiation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Negotiating,
    Connected,
    Closed,
}

/// Events a session surfaces to its owner. Candidates and outbound
/// offers/answers go to the signal sink instead; these are the things
/// a UI or game loop cares about.
pub enum SessionEvent {
    /// Underlying transport state, forwarded as-is.
    StateChanged(RTCPeerConnectionState),
    /// Fired exactly once, on the first transition to connected.
    Established,
    /// Remote media arrived.
    TrackReceived(Arc<TrackRemote>),
    /// The game data channel is open on this end.
    GameChannelOpen,
    /// A decoded move from the room mate.
    MoveReceived(GamePacket),
    /// The transport failed or was torn down.
    Closed,
}

// Manual impl: the remote track handle has no Debug of its own.
impl fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::StateChanged(state) => {
                f.debug_tuple("StateChanged").field(state).finish()
            }
            SessionEvent::Established => write!(f, "Established"),
            SessionEvent::TrackReceived(track) => {
                f.debug_tuple("TrackReceived").field(&track.id()).finish()
            }
            SessionEvent::GameChannelOpen => write!(f, "GameChannelOpen"),
            SessionEvent::MoveReceived(packet) => {
                f.debug_tuple("MoveReceived").field(packet).finish()
            }
            SessionEvent::Closed => write!(f, "Closed"),
        }
    }
}
