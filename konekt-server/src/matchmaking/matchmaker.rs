use crate::matchmaking::{MatchCommand, MatchEngine};
use crate::signaling::SignalingOutput;
use konekt_core::GameKind;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Single-task owner of the match engine. All queue and room state is
/// touched only from this loop, so the engine needs no locks; the
/// command channel is the serialization point.
pub struct Matchmaker {
    engine: MatchEngine,
    command_rx: mpsc::Receiver<MatchCommand>,
    signaling: Arc<dyn SignalingOutput>,
}

impl Matchmaker {
    pub fn new(command_rx: mpsc::Receiver<MatchCommand>, signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            engine: MatchEngine::new(),
            command_rx,
            signaling,
        }
    }

    pub async fn run(mut self) {
        info!("matchmaker loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("matchmaker loop finished");
    }

    async fn handle_command(&mut self, cmd: MatchCommand) {
        match cmd {
            MatchCommand::Join {
                peer_id,
                user_name,
                game,
            } => {
                self.engine.enqueue(peer_id, user_name, game);
                self.signaling.waiting_for_match(peer_id).await;
                self.pair_if_ready(game).await;
            }

            MatchCommand::Leave { peer_id } | MatchCommand::Disconnect { peer_id } => {
                let Some(removed) = self.engine.remove_user(peer_id) else {
                    debug!(%peer_id, "removal of unknown user is a no-op");
                    return;
                };
                if let Some(mate) = removed.mate {
                    self.signaling.room_mate_left(mate).await;
                    // The freed mate is back at the queue tail; a third
                    // party may already be waiting for them.
                    self.pair_if_ready(removed.game).await;
                }
            }

            MatchCommand::Shuffle { peer_id } => {
                let Some(shuffled) = self.engine.shuffle(peer_id) else {
                    debug!(%peer_id, "shuffle outside a room is a no-op");
                    return;
                };
                if let Some((mate, _)) = shuffled.mate {
                    self.signaling.room_mate_left(mate).await;
                }
                // Two independent pairing attempts: either side, both,
                // or neither may find a match right away.
                self.pair_if_ready(shuffled.game).await;
                if let Some((_, mate_game)) = shuffled.mate {
                    self.pair_if_ready(mate_game).await;
                }
            }

            MatchCommand::Relay { peer_id, signal } => {
                // Routing only needs room membership; it is deliberately
                // independent of how far the negotiation has progressed.
                let Some(mate) = self.engine.room_mate(&peer_id) else {
                    debug!(%peer_id, "relay without a room mate dropped");
                    return;
                };
                let from = self
                    .engine
                    .user(&peer_id)
                    .map(|user| user.user_name.clone())
                    .unwrap_or_default();
                self.signaling.relay(mate, signal, from).await;
            }

            MatchCommand::Stats { reply } => {
                let _ = reply.send(self.engine.stats());
            }
        }
    }

    async fn pair_if_ready(&mut self, game: GameKind) {
        let Some(paired) = self.engine.try_pair(game) else {
            return;
        };
        for member in paired.users {
            self.signaling
                .room_created(member, paired.room_id, paired.users)
                .await;
        }
    }
}
