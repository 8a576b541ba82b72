use crate::config::SessionConfig;
use crate::events::{SessionEvent, SessionState};
use crate::sink::SignalSink;
use anyhow::Context;
use konekt_core::{ClientMessage, GamePacket, PoliteRole, ServerMessage, GAME_CHANNEL_LABEL};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::track::track_local::TrackLocal;

/// What `handle_remote_offer` did with the offer, observable so the
/// glare asymmetry can be tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    /// Applied as remote description and answered.
    Applied,
    /// Discarded: glare on the impolite side, or the session is closed.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Applied,
    /// Arrived in a state that was not expecting one; dropped.
    Stray,
}

enum DriverCmd {
    Offer,
    OpenGameChannel,
    Shutdown,
}

/// The peer connection is replaced wholesale when the polite side
/// yields under glare, so everything that touches it goes through this
/// lock and takes a fresh clone per operation.
type SharedTransport = Arc<RwLock<Arc<RTCPeerConnection>>>;

struct SessionShared {
    closed: AtomicBool,
    /// Bumped on every transport rebuild. Callbacks wired to an older
    /// transport compare against it and go quiet instead of reporting
    /// the teardown of a connection the session already abandoned.
    generation: AtomicU64,
    making_offer: AtomicBool,
    established: AtomicBool,
    state: StdMutex<SessionState>,
    game_channel: Mutex<Option<Arc<RTCDataChannel>>>,
    tracks: Mutex<Vec<Arc<dyn TrackLocal + Send + Sync>>>,
    events: mpsc::Sender<SessionEvent>,
}

impl SessionShared {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.is_closed() || self.generation.load(Ordering::SeqCst) != generation
    }

    fn note_negotiating(&self) {
        let mut state = self.state.lock().expect("state lock poisoned");
        if *state == SessionState::Idle {
            *state = SessionState::Negotiating;
        }
    }
}

/// Client-side peer negotiation manager: one per active room. Drives
/// the offer/answer/candidate exchange for a direct peer transport,
/// resolves simultaneous-offer races through the polite/impolite
/// roles, and multiplexes the game data channel on the same transport.
pub struct NegotiationSession {
    role: PoliteRole,
    transport: SharedTransport,
    config: SessionConfig,
    shared: Arc<SessionShared>,
    sink: Arc<dyn SignalSink>,
    driver_tx: mpsc::Sender<DriverCmd>,
}

impl NegotiationSession {
    pub async fn connect(
        role: PoliteRole,
        config: SessionConfig,
        sink: Arc<dyn SignalSink>,
        events: mpsc::Sender<SessionEvent>,
    ) -> anyhow::Result<Self> {
        let shared = Arc::new(SessionShared {
            closed: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            making_offer: AtomicBool::new(false),
            established: AtomicBool::new(false),
            state: StdMutex::new(SessionState::Idle),
            game_channel: Mutex::new(None),
            tracks: Mutex::new(Vec::new()),
            events,
        });

        let (driver_tx, driver_rx) = mpsc::channel(16);

        let pc = build_transport(role, &config, &shared, &sink, &driver_tx, 0).await?;
        let transport: SharedTransport = Arc::new(RwLock::new(pc));

        tokio::spawn(drive(
            transport.clone(),
            shared.clone(),
            sink.clone(),
            driver_rx,
        ));

        Ok(Self {
            role,
            transport,
            config,
            shared,
            sink,
            driver_tx,
        })
    }

    pub fn role(&self) -> PoliteRole {
        self.role
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.lock().expect("state lock poisoned")
    }

    pub async fn signaling_state(&self) -> RTCSignalingState {
        self.transport.read().await.signaling_state()
    }

    /// Dispatch a relayed signaling message. Negotiation failures are
    /// logged, never propagated: an unhandled error here must not take
    /// down the loop the room depends on.
    pub async fn handle_signal(&self, msg: ServerMessage) {
        match msg {
            ServerMessage::Offer { sdp, .. } => {
                if let Err(e) = self.handle_remote_offer(sdp).await {
                    warn!("error handling remote offer: {e:#}");
                }
            }
            ServerMessage::Answer { sdp, .. } => {
                if let Err(e) = self.handle_remote_answer(sdp).await {
                    warn!("error handling remote answer: {e:#}");
                }
            }
            ServerMessage::Candidate { candidate, .. } => {
                self.add_remote_candidate(candidate).await;
            }
            ServerMessage::RoomMateLeft { .. } => {
                if let Err(e) = self.close().await {
                    warn!("error tearing down session: {e:#}");
                }
            }
            other => debug!("signal not for the session: {other:?}"),
        }
    }

    /// Apply a remote offer, resolving glare by role: the impolite
    /// side discards a colliding offer and lets its own win; the
    /// polite side yields and accepts.
    pub async fn handle_remote_offer(&self, sdp: String) -> anyhow::Result<OfferOutcome> {
        if self.shared.is_closed() {
            return Ok(OfferOutcome::Ignored);
        }

        let making_offer = self.shared.making_offer.load(Ordering::SeqCst);
        let pc = self.transport.read().await.clone();
        let stable = pc.signaling_state() == RTCSignalingState::Stable;

        if should_ignore_offer(self.role, making_offer, stable) {
            debug!("glare: impolite side ignoring remote offer");
            return Ok(OfferOutcome::Ignored);
        }

        if making_offer || !stable {
            // The stack cannot roll back an in-flight local
            // description, so yielding means starting over: a fresh
            // transport, re-populated with the retained local tracks,
            // accepts the winning offer. The making-offer flag stays
            // up throughout to hold off driver offers until the new
            // transport has answered.
            self.shared.making_offer.store(true, Ordering::SeqCst);
            let outcome = self.yield_and_accept(sdp).await;
            self.shared.making_offer.store(false, Ordering::SeqCst);

            if outcome.is_ok() && !self.shared.tracks.lock().await.is_empty() {
                // The winning offer knows nothing of the re-added
                // tracks; follow up with an offer of our own now that
                // both sides are stable again.
                let _ = self.driver_tx.send(DriverCmd::Offer).await;
            }
            return outcome;
        }

        self.apply_offer(&pc, sdp).await
    }

    async fn yield_and_accept(&self, sdp: String) -> anyhow::Result<OfferOutcome> {
        let fresh = self.rebuild_transport().await?;
        self.apply_offer(&fresh, sdp).await
    }

    async fn apply_offer(
        &self,
        pc: &Arc<RTCPeerConnection>,
        sdp: String,
    ) -> anyhow::Result<OfferOutcome> {
        let offer = RTCSessionDescription::offer(sdp).context("invalid remote offer sdp")?;
        pc.set_remote_description(offer).await?;

        let answer = pc.create_answer(None).await?;
        let answer_sdp = answer.sdp.clone();
        pc.set_local_description(answer).await?;
        self.sink
            .send(ClientMessage::Answer { sdp: answer_sdp })
            .await?;

        self.shared.note_negotiating();
        Ok(OfferOutcome::Applied)
    }

    /// Replace the peer connection with a freshly built one carrying
    /// the same callbacks under the next generation. The retained
    /// local tracks move over; the abandoned game channel does not.
    async fn rebuild_transport(&self) -> anyhow::Result<Arc<RTCPeerConnection>> {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "rebuilding peer transport");

        let fresh = build_transport(
            self.role,
            &self.config,
            &self.shared,
            &self.sink,
            &self.driver_tx,
            generation,
        )
        .await?;

        *self.shared.game_channel.lock().await = None;
        for track in self.shared.tracks.lock().await.iter() {
            fresh
                .add_track(track.clone())
                .await
                .context("failed to re-add local track")?;
        }

        let old = {
            let mut guard = self.transport.write().await;
            std::mem::replace(&mut *guard, fresh.clone())
        };
        if let Err(e) = old.close().await {
            warn!("failed to close the yielded transport: {e}");
        }

        Ok(fresh)
    }

    /// Apply a remote answer if one is expected. A duplicate or late
    /// answer after the session stabilized is dropped, not an error.
    pub async fn handle_remote_answer(&self, sdp: String) -> anyhow::Result<AnswerOutcome> {
        if self.shared.is_closed() {
            return Ok(AnswerOutcome::Stray);
        }
        let pc = self.transport.read().await.clone();
        if pc.signaling_state() != RTCSignalingState::HaveLocalOffer {
            debug!("answer received outside have-local-offer; dropped");
            return Ok(AnswerOutcome::Stray);
        }

        let answer = RTCSessionDescription::answer(sdp).context("invalid remote answer sdp")?;
        pc.set_remote_description(answer).await?;
        Ok(AnswerOutcome::Applied)
    }

    /// Apply a relayed candidate immediately. Candidates can outrun
    /// the description they belong to; failures are logged and
    /// swallowed.
    pub async fn add_remote_candidate(&self, candidate: String) {
        if self.shared.is_closed() {
            return;
        }
        let init: RTCIceCandidateInit = match serde_json::from_str(&candidate) {
            Ok(init) => init,
            Err(e) => {
                warn!("unparseable remote candidate: {e}");
                return;
            }
        };
        let pc = self.transport.read().await.clone();
        if let Err(e) = pc.add_ice_candidate(init).await {
            warn!("failed to add remote candidate: {e}");
        }
    }

    /// Hand an outbound media track to the transport. The handle is
    /// retained so a rebuilt transport can be re-populated after a
    /// yield. Triggers the negotiation-needed path.
    pub async fn add_track(&self, track: Arc<dyn TrackLocal + Send + Sync>) -> anyhow::Result<()> {
        let pc = self.transport.read().await.clone();
        pc.add_track(track.clone())
            .await
            .context("failed to add local track")?;
        self.shared.tracks.lock().await.push(track);
        Ok(())
    }

    pub async fn local_tracks(&self) -> Vec<Arc<dyn TrackLocal + Send + Sync>> {
        self.shared.tracks.lock().await.clone()
    }

    /// Kick off an outbound offer round. Media changes do this through
    /// the transport's negotiation-needed signal; sessions without
    /// media call it directly.
    pub async fn renegotiate(&self) {
        let _ = self.driver_tx.send(DriverCmd::Offer).await;
    }

    /// Send a game move to the room mate over the data channel.
    pub async fn send_move(&self, game_move: serde_json::Value) -> anyhow::Result<()> {
        let payload = GamePacket::Move { game_move }.encode()?;
        let guard = self.shared.game_channel.lock().await;
        let dc = guard
            .as_ref()
            .context("game channel is not open; cannot send move")?;
        if dc.ready_state() != RTCDataChannelState::Open {
            anyhow::bail!("game channel is not open; cannot send move");
        }
        dc.send_text(payload).await?;
        Ok(())
    }

    /// Tear the session down. Safe to call any number of times.
    pub async fn close(&self) -> anyhow::Result<()> {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        *self.shared.state.lock().expect("state lock poisoned") = SessionState::Closed;
        let _ = self.driver_tx.send(DriverCmd::Shutdown).await;
        let _ = self.shared.events.send(SessionEvent::Closed).await;
        let pc = self.transport.read().await.clone();
        pc.close().await?;
        Ok(())
    }
}

/// The glare rule from perfect negotiation: only the impolite side
/// discards a colliding remote offer.
fn should_ignore_offer(role: PoliteRole, making_offer: bool, stable: bool) -> bool {
    let collision = making_offer || !stable;
    !role.is_polite() && collision
}

/// Build a peer connection and wire every callback under the given
/// generation. Used once at session start and again on each polite
/// yield.
async fn build_transport(
    role: PoliteRole,
    config: &SessionConfig,
    shared: &Arc<SessionShared>,
    sink: &Arc<dyn SignalSink>,
    driver_tx: &mpsc::Sender<DriverCmd>,
    generation: u64,
) -> anyhow::Result<Arc<RTCPeerConnection>> {
    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs()?;
    let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

    let api = APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .build();

    let rtc_config = RTCConfiguration {
        ice_servers: config.rtc_ice_servers(),
        ..Default::default()
    };

    let pc = Arc::new(api.new_peer_connection(rtc_config).await?);

    // Locally produced candidates go straight out through the
    // signaling channel; the server routes them to the room mate.
    let ice_sink = sink.clone();
    let ice_shared = shared.clone();
    pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
        let sink = ice_sink.clone();
        let shared = ice_shared.clone();
        Box::pin(async move {
            if shared.is_stale(generation) {
                return;
            }
            let Some(candidate) = candidate else { return };
            let Ok(init) = candidate.to_json() else {
                return;
            };
            let Ok(payload) = serde_json::to_string(&init) else {
                return;
            };
            if let Err(e) = sink.send(ClientMessage::Candidate { candidate: payload }).await {
                warn!("failed to relay local candidate: {e:#}");
            }
        })
    }));

    let track_shared = shared.clone();
    pc.on_track(Box::new(move |track, _receiver, _transceiver| {
        let shared = track_shared.clone();
        Box::pin(async move {
            if shared.is_stale(generation) {
                return;
            }
            debug!("remote track received: {}", track.id());
            let _ = shared.events.send(SessionEvent::TrackReceived(track)).await;
        })
    }));

    let state_shared = shared.clone();
    let state_driver_tx = driver_tx.clone();
    pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
        let shared = state_shared.clone();
        let driver_tx = state_driver_tx.clone();
        Box::pin(async move {
            if shared.is_stale(generation) {
                return;
            }
            debug!("peer connection state: {state}");
            let _ = shared.events.send(SessionEvent::StateChanged(state)).await;

            match state {
                RTCPeerConnectionState::Connected => {
                    // Fire the one-time establishment hook: the
                    // impolite side opens the game channel, the
                    // polite side waits for it to arrive.
                    if !shared.established.swap(true, Ordering::SeqCst) {
                        *shared.state.lock().expect("state lock poisoned") =
                            SessionState::Connected;
                        info!("peer transport established");
                        let _ = shared.events.send(SessionEvent::Established).await;
                        if !role.is_polite() {
                            let _ = driver_tx.send(DriverCmd::OpenGameChannel).await;
                        }
                    }
                }
                RTCPeerConnectionState::Failed
                | RTCPeerConnectionState::Disconnected
                | RTCPeerConnectionState::Closed => {
                    let _ = shared.events.send(SessionEvent::Closed).await;
                }
                _ => {}
            }
        })
    }));

    // Only the game channel is accepted; anything else on the
    // transport is not part of the contract.
    let dc_shared = shared.clone();
    pc.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
        let shared = dc_shared.clone();
        Box::pin(async move {
            if shared.is_stale(generation) {
                return;
            }
            if dc.label() != GAME_CHANNEL_LABEL {
                debug!("ignoring unexpected data channel '{}'", dc.label());
                return;
            }
            wire_game_channel(shared, generation, dc).await;
        })
    }));

    // Track composition changed (or a channel was added): ask the
    // driver for a fresh offer. The making-offer guard in the
    // driver keeps concurrent triggers from overlapping.
    let nego_shared = shared.clone();
    let nego_driver_tx = driver_tx.clone();
    pc.on_negotiation_needed(Box::new(move || {
        let shared = nego_shared.clone();
        let driver_tx = nego_driver_tx.clone();
        Box::pin(async move {
            if shared.is_stale(generation) {
                return;
            }
            let _ = driver_tx.send(DriverCmd::Offer).await;
        })
    }));

    Ok(pc)
}

/// Owns the peer-connection work that callbacks must not do in place.
/// Exits on shutdown, so the connection handle is not kept alive by
/// its own handlers.
async fn drive(
    transport: SharedTransport,
    shared: Arc<SessionShared>,
    sink: Arc<dyn SignalSink>,
    mut rx: mpsc::Receiver<DriverCmd>,
) {
    while let Some(cmd) = rx.recv().await {
        if shared.is_closed() {
            break;
        }
        match cmd {
            DriverCmd::Offer => send_offer(&transport, &shared, sink.as_ref()).await,
            DriverCmd::OpenGameChannel => open_game_channel(&transport, &shared).await,
            DriverCmd::Shutdown => break,
        }
    }
    debug!("session driver finished");
}

async fn send_offer(transport: &SharedTransport, shared: &Arc<SessionShared>, sink: &dyn SignalSink) {
    let pc = transport.read().await.clone();
    if pc.signaling_state() != RTCSignalingState::Stable {
        debug!("offer skipped; negotiation already in flight");
        return;
    }
    if shared.making_offer.swap(true, Ordering::SeqCst) {
        return;
    }

    let result: anyhow::Result<()> = async {
        let offer = pc.create_offer(None).await?;
        let sdp = offer.sdp.clone();
        pc.set_local_description(offer).await?;
        sink.send(ClientMessage::Offer { sdp }).await?;
        Ok(())
    }
    .await;

    shared.making_offer.store(false, Ordering::SeqCst);
    shared.note_negotiating();

    if let Err(e) = result {
        warn!("negotiation error: {e:#}");
    }
}

async fn open_game_channel(transport: &SharedTransport, shared: &Arc<SessionShared>) {
    let pc = transport.read().await.clone();
    let generation = shared.generation.load(Ordering::SeqCst);
    match pc.create_data_channel(GAME_CHANNEL_LABEL, None).await {
        Ok(dc) => wire_game_channel(shared.clone(), generation, dc).await,
        Err(e) => warn!("failed to create game channel: {e}"),
    }
}

async fn wire_game_channel(shared: Arc<SessionShared>, generation: u64, dc: Arc<RTCDataChannel>) {
    let open_shared = shared.clone();
    dc.on_open(Box::new(move || {
        let shared = open_shared.clone();
        Box::pin(async move {
            if shared.is_stale(generation) {
                return;
            }
            info!("game channel open");
            let _ = shared.events.send(SessionEvent::GameChannelOpen).await;
        })
    }));

    let msg_shared = shared.clone();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let shared = msg_shared.clone();
        Box::pin(async move {
            if shared.is_stale(generation) {
                return;
            }
            match GamePacket::decode(&msg.data) {
                Ok(GamePacket::Unknown) => debug!("unknown game packet tag ignored"),
                Ok(packet) => {
                    let _ = shared.events.send(SessionEvent::MoveReceived(packet)).await;
                }
                Err(e) => warn!("unparseable game packet: {e}"),
            }
        })
    }));

    dc.on_error(Box::new(move |e| {
        Box::pin(async move {
            warn!("game channel error: {e}");
        })
    }));

    *shared.game_channel.lock().await = Some(dc);
}
