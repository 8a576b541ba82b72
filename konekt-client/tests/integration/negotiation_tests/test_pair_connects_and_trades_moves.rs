use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use webrtc::api::media_engine::MIME_TYPE_VP8;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use konekt_client::{NegotiationSession, SessionConfig, SessionEvent};
use konekt_core::{GamePacket, PoliteRole};

use crate::integration::{init_tracing, wait_for_event};
use crate::utils::{CaptureSink, pump_signals};

/// Full two-party run over loopback: the impolite side offers a video
/// track, both transports connect, the game channel opens after
/// renegotiation, and a move crosses in each direction.
#[tokio::test]
async fn test_pair_connects_and_trades_moves() {
    init_tracing();

    let (impolite_sink, impolite_out) = CaptureSink::new();
    let (polite_sink, polite_out) = CaptureSink::new();

    let (impolite_events_tx, mut impolite_events) = mpsc::channel(64);
    let (polite_events_tx, mut polite_events) = mpsc::channel(64);

    let impolite = Arc::new(
        NegotiationSession::connect(
            PoliteRole::Impolite,
            SessionConfig::without_ice_servers(),
            impolite_sink,
            impolite_events_tx,
        )
        .await
        .expect("failed to create impolite session"),
    );
    let polite = Arc::new(
        NegotiationSession::connect(
            PoliteRole::Polite,
            SessionConfig::without_ice_servers(),
            polite_sink,
            polite_events_tx,
        )
        .await
        .expect("failed to create polite session"),
    );

    // Cross-wire the sinks so each side's signaling lands on the other.
    let _impolite_pump = pump_signals(impolite_out, polite.clone());
    let _polite_pump = pump_signals(polite_out, impolite.clone());

    // Adding a track fires the negotiation-needed path and produces
    // the first offer.
    let track = Arc::new(TrackLocalStaticSample::new(
        RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_owned(),
            ..Default::default()
        },
        "video".to_owned(),
        "konekt-test".to_owned(),
    ));
    impolite
        .add_track(track.clone())
        .await
        .expect("failed to add local track");
    assert_eq!(impolite.local_tracks().await.len(), 1);

    wait_for_event(
        &mut impolite_events,
        |e| matches!(e, SessionEvent::Established),
        "impolite establishment",
    )
    .await;
    wait_for_event(
        &mut polite_events,
        |e| matches!(e, SessionEvent::Established),
        "polite establishment",
    )
    .await;

    // The receiver only surfaces the track once RTP arrives, so keep
    // a trickle of dummy samples flowing for the rest of the test.
    let media_task = tokio::spawn({
        let track = track.clone();
        async move {
            loop {
                let sample = Sample {
                    data: vec![0u8; 32].into(),
                    duration: Duration::from_millis(33),
                    ..Default::default()
                };
                let _ = track.write_sample(&sample).await;
                tokio::time::sleep(Duration::from_millis(33)).await;
            }
        }
    });

    // The impolite side opens the channel once connected; it reaches
    // the polite side through a renegotiation round.
    wait_for_event(
        &mut impolite_events,
        |e| matches!(e, SessionEvent::GameChannelOpen),
        "impolite game channel",
    )
    .await;
    wait_for_event(
        &mut polite_events,
        |e| matches!(e, SessionEvent::GameChannelOpen),
        "polite game channel",
    )
    .await;

    // The polite side also saw the offered track.
    wait_for_event(
        &mut polite_events,
        |e| matches!(e, SessionEvent::TrackReceived(_)),
        "remote track",
    )
    .await;

    impolite
        .send_move(json!({"from": "e2", "to": "e4"}))
        .await
        .expect("impolite move send failed");
    let event = wait_for_event(
        &mut polite_events,
        |e| matches!(e, SessionEvent::MoveReceived(_)),
        "move on the polite side",
    )
    .await;
    let SessionEvent::MoveReceived(GamePacket::Move { game_move }) = event else {
        panic!("expected a move packet");
    };
    assert_eq!(game_move, json!({"from": "e2", "to": "e4"}));

    polite
        .send_move(json!({"from": "e7", "to": "e5"}))
        .await
        .expect("polite move send failed");
    wait_for_event(
        &mut impolite_events,
        |e| matches!(e, SessionEvent::MoveReceived(_)),
        "move on the impolite side",
    )
    .await;

    media_task.abort();
    impolite.close().await.expect("impolite close failed");
    polite.close().await.expect("polite close failed");
}
