use crate::matchmaking::{MatchCommand, RelaySignal};
use crate::signaling::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use konekt_core::{ClientMessage, PeerId, ServerMessage};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    // Connection identity is server-assigned and opaque; a reconnect
    // is a brand-new peer.
    let peer_id = PeerId::new();

    ws.on_upgrade(move |socket| handle_socket(socket, peer_id, service))
}

async fn handle_socket(socket: WebSocket, peer_id: PeerId, service: SignalingService) {
    info!("new signaling connection: {peer_id}");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_peer(peer_id, tx);
    service.send(peer_id, ServerMessage::Welcome { peer_id });

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_msg) => {
                            let cmd = to_command(peer_id, client_msg);
                            if let Err(e) = service.match_cmd_tx.send(cmd).await {
                                error!("matchmaker died: {e}");
                                break;
                            }
                        }
                        Err(e) => warn!("invalid client message from {peer_id}: {e}"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            let _ = service
                .match_cmd_tx
                .send(MatchCommand::Disconnect { peer_id })
                .await;
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_peer(&peer_id);
    info!("signaling connection closed: {peer_id}");
}

fn to_command(peer_id: PeerId, msg: ClientMessage) -> MatchCommand {
    match msg {
        ClientMessage::JoinQueue { user_name, game } => MatchCommand::Join {
            peer_id,
            user_name,
            game,
        },
        ClientMessage::LeaveQueue => MatchCommand::Leave { peer_id },
        ClientMessage::ShuffleQueue => MatchCommand::Shuffle { peer_id },
        ClientMessage::Offer { sdp } => MatchCommand::Relay {
            peer_id,
            signal: RelaySignal::Offer(sdp),
        },
        ClientMessage::Answer { sdp } => MatchCommand::Relay {
            peer_id,
            signal: RelaySignal::Answer(sdp),
        },
        ClientMessage::Candidate { candidate } => MatchCommand::Relay {
            peer_id,
            signal: RelaySignal::Candidate(candidate),
        },
    }
}
