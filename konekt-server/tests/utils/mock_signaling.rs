use async_trait::async_trait;
use konekt_core::{PeerId, RoomId};
use konekt_server::{RelaySignal, SignalingOutput};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

#[derive(Debug, Clone)]
pub enum SignalMessage {
    WaitingForMatch {
        peer_id: PeerId,
    },
    RoomCreated {
        peer_id: PeerId,
        room_id: RoomId,
        users: [PeerId; 2],
    },
    RoomMateLeft {
        peer_id: PeerId,
    },
    Relay {
        peer_id: PeerId,
        signal: RelaySignal,
        from: String,
    },
}

/// Mock SignalingOutput that captures all outgoing signals.
#[derive(Clone)]
pub struct MockSignalingOutput {
    /// Channel to send captured signals.
    tx: mpsc::UnboundedSender<SignalMessage>,
    /// All captured signals (for verification).
    signals: Arc<Mutex<Vec<SignalMessage>>>,
}

impl MockSignalingOutput {
    /// Create a new MockSignalingOutput and its receiver channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SignalMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            signals: Arc::new(Mutex::new(Vec::new())),
        };
        (signaling, rx)
    }

    /// Get the room notification sent to a specific peer (if any).
    pub async fn room_created_for(&self, peer_id: &PeerId) -> Option<(RoomId, [PeerId; 2])> {
        self.signals.lock().await.iter().find_map(|s| match s {
            SignalMessage::RoomCreated {
                peer_id: id,
                room_id,
                users,
            } if id == peer_id => Some((*room_id, *users)),
            _ => None,
        })
    }

    /// All relayed payloads delivered to a specific peer, in order.
    pub async fn relays_for(&self, peer_id: &PeerId) -> Vec<(RelaySignal, String)> {
        self.signals
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                SignalMessage::Relay {
                    peer_id: id,
                    signal,
                    from,
                } if id == peer_id => Some((signal.clone(), from.clone())),
                _ => None,
            })
            .collect()
    }

    /// How many mate-left notices a specific peer received.
    pub async fn mate_left_count(&self, peer_id: &PeerId) -> usize {
        self.signals
            .lock()
            .await
            .iter()
            .filter(|s| matches!(s, SignalMessage::RoomMateLeft { peer_id: id } if id == peer_id))
            .count()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn waiting_for_match(&self, peer_id: PeerId) {
        tracing::debug!("[MockSignaling] waiting_for_match to {:?}", peer_id);

        let msg = SignalMessage::WaitingForMatch { peer_id };

        self.signals.lock().await.push(msg.clone());
        let _ = self.tx.send(msg);
    }

    async fn room_created(&self, peer_id: PeerId, room_id: RoomId, users: [PeerId; 2]) {
        tracing::debug!("[MockSignaling] room_created to {:?}", peer_id);

        let msg = SignalMessage::RoomCreated {
            peer_id,
            room_id,
            users,
        };

        self.signals.lock().await.push(msg.clone());
        let _ = self.tx.send(msg);
    }

    async fn room_mate_left(&self, peer_id: PeerId) {
        tracing::debug!("[MockSignaling] room_mate_left to {:?}", peer_id);

        let msg = SignalMessage::RoomMateLeft { peer_id };

        self.signals.lock().await.push(msg.clone());
        let _ = self.tx.send(msg);
    }

    async fn relay(&self, peer_id: PeerId, signal: RelaySignal, from: String) {
        tracing::debug!("[MockSignaling] relay to {:?}", peer_id);

        let msg = SignalMessage::Relay {
            peer_id,
            signal,
            from,
        };

        self.signals.lock().await.push(msg.clone());
        let _ = self.tx.send(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_signaling_captures_room_created() {
        let (signaling, mut rx) = MockSignalingOutput::new();
        let peer_id = PeerId::new();
        let mate_id = PeerId::new();
        let room_id = RoomId::new();

        signaling
            .room_created(peer_id, room_id, [peer_id, mate_id])
            .await;

        let msg = rx.recv().await.unwrap();
        assert!(matches!(msg, SignalMessage::RoomCreated { .. }));

        let captured = signaling.room_created_for(&peer_id).await;
        assert_eq!(captured, Some((room_id, [peer_id, mate_id])));
    }

    #[tokio::test]
    async fn test_mock_signaling_captures_relay() {
        let (signaling, _rx) = MockSignalingOutput::new();
        let peer_id = PeerId::new();

        signaling
            .relay(peer_id, RelaySignal::Offer("sdp".into()), "alice".into())
            .await;

        let relays = signaling.relays_for(&peer_id).await;
        assert_eq!(relays.len(), 1);
        assert!(matches!(&relays[0].0, RelaySignal::Offer(sdp) if sdp == "sdp"));
        assert_eq!(relays[0].1, "alice");
    }
}
