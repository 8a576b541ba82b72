use konekt_core::{GameKind, PeerId};

use crate::integration::{init_tracing, join, recv_room_created, start_matchmaker};

#[tokio::test]
async fn test_game_kinds_queue_separately() {
    init_tracing();

    let (cmd_tx, mut signal_rx, signaling) = start_matchmaker();

    let chess_player = PeerId::new();
    let ttt_player = PeerId::new();
    let second_chess_player = PeerId::new();

    join(&cmd_tx, chess_player, "alice", GameKind::Chess).await;
    join(&cmd_tx, ttt_player, "bob", GameKind::TicTacToe).await;

    // Different kinds never match each other.
    join(&cmd_tx, second_chess_player, "carol", GameKind::Chess).await;

    let (_, users) = recv_room_created(&mut signal_rx, chess_player).await;
    assert_eq!(users, [chess_player, second_chess_player]);

    // The tic-tac-toe player is still alone in their queue.
    assert!(signaling.room_created_for(&ttt_player).await.is_none());
}
