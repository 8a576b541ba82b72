use crate::model::{GameKind, PeerId, RoomId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Public STUN servers used when the deployment does not supply its
/// own relay-discovery set.
pub fn default_stun_servers() -> Vec<IceServerConfig> {
    ["stun:stun.l.google.com:19302", "stun:stun1.l.google.com:19302"]
        .into_iter()
        .map(|url| IceServerConfig {
            urls: vec![url.to_string()],
            username: None,
            credential: None,
        })
        .collect()
}

/// Messages a client sends over the signaling socket. Offer/answer/
/// candidate carry no addressing: the server routes them to the
/// sender's room mate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinQueue { user_name: String, game: GameKind },
    LeaveQueue,
    ShuffleQueue,
    Offer { sdp: String },
    Answer { sdp: String },
    Candidate { candidate: String },
}

/// Messages the server pushes to a client. `from` on the relayed
/// variants is the sender's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ServerMessage {
    Welcome { peer_id: PeerId },
    WaitingForMatch,
    RoomCreated {
        room_id: RoomId,
        users: [PeerId; 2],
        message: String,
    },
    RoomMateLeft { message: String },
    Offer { sdp: String, from: String },
    Answer { sdp: String, from: String },
    Candidate { candidate: String, from: String },
}
