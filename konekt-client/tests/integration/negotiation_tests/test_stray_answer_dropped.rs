use serde_json::json;
use tokio::sync::mpsc;

use konekt_client::{AnswerOutcome, NegotiationSession, SessionConfig, SessionState};
use konekt_core::PoliteRole;

use crate::integration::init_tracing;
use crate::utils::CaptureSink;

#[tokio::test]
async fn test_stray_answer_dropped() {
    init_tracing();

    let (sink, _out) = CaptureSink::new();
    let (events_tx, _events) = mpsc::channel(64);

    let session = NegotiationSession::connect(
        PoliteRole::Polite,
        SessionConfig::without_ice_servers(),
        sink,
        events_tx,
    )
    .await
    .expect("failed to create session");

    // No local offer is pending, so an answer has nothing to complete.
    let outcome = session
        .handle_remote_answer("v=0 stale-answer".into())
        .await
        .expect("a stray answer must not error");
    assert_eq!(outcome, AnswerOutcome::Stray);

    // Without an open game channel a move has nowhere to go.
    assert!(session.send_move(json!({"from": "e2"})).await.is_err());

    assert_eq!(session.state(), SessionState::Idle);
    session.close().await.expect("close failed");
    session.close().await.expect("second close must be a no-op");
}
