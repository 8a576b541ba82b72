use crate::matchmaking::{MatchCommand, RelaySignal};
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use konekt_core::{PeerId, RoomId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

struct SignalingInner {
    peers: DashMap<PeerId, mpsc::UnboundedSender<Message>>,
}

/// Registry of live signaling sockets. Each connection parks an
/// unbounded sender here; the matchmaker pushes `ServerMessage`s
/// through it via the `SignalingOutput` impl.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) match_cmd_tx: mpsc::Sender<MatchCommand>,
}

impl SignalingService {
    pub fn new(match_cmd_tx: mpsc::Sender<MatchCommand>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
            match_cmd_tx,
        }
    }

    pub fn add_peer(&self, peer_id: PeerId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(peer_id, tx);
    }

    pub fn remove_peer(&self, peer_id: &PeerId) {
        self.inner.peers.remove(peer_id);
    }

    /// Snapshot of the matchmaker's tables, or `None` if its loop is
    /// gone.
    pub async fn stats(&self) -> Option<crate::matchmaking::EngineStats> {
        let (reply, rx) = tokio::sync::oneshot::channel();
        self.match_cmd_tx
            .send(MatchCommand::Stats { reply })
            .await
            .ok()?;
        rx.await.ok()
    }

    pub fn send(&self, peer_id: PeerId, msg: ServerMessage) {
        if let Some(peer) = self.inner.peers.get(&peer_id) {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if let Err(e) = peer.send(Message::Text(json.into())) {
                        error!("failed to send ws message to {peer_id}: {e:?}");
                    }
                }
                Err(e) => error!("failed to serialize server message: {e}"),
            }
        } else {
            warn!("attempted to send to disconnected peer {peer_id}");
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn waiting_for_match(&self, peer_id: PeerId) {
        self.send(peer_id, ServerMessage::WaitingForMatch);
    }

    async fn room_created(&self, peer_id: PeerId, room_id: RoomId, users: [PeerId; 2]) {
        self.send(
            peer_id,
            ServerMessage::RoomCreated {
                room_id,
                users,
                message: "Matched! Say hi to your partner.".to_string(),
            },
        );
    }

    async fn room_mate_left(&self, peer_id: PeerId) {
        self.send(
            peer_id,
            ServerMessage::RoomMateLeft {
                message: "Your partner left. Looking for a new match...".to_string(),
            },
        );
    }

    async fn relay(&self, peer_id: PeerId, signal: RelaySignal, from: String) {
        let msg = match signal {
            RelaySignal::Offer(sdp) => ServerMessage::Offer { sdp, from },
            RelaySignal::Answer(sdp) => ServerMessage::Answer { sdp, from },
            RelaySignal::Candidate(candidate) => ServerMessage::Candidate { candidate, from },
        };
        self.send(peer_id, msg);
    }
}
