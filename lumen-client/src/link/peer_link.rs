use crate::capture::LocalMedia;
use crate::error::NegotiationError;
use crate::link::{LinkCommand, NegotiationRole, NegotiationState};
use crate::observer::SessionObserver;
use crate::signaling::SignalSink;
use crate::transport::{Connectivity, PeerTransport, TransportEvent, TransportFactory};
use dashmap::DashMap;
use lumen_core::{ClientSignal, IceCandidate, IceServerConfig, ParticipantId};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

const TRANSPORT_EVENT_CAPACITY: usize = 64;

pub type LinkTable = DashMap<ParticipantId, LinkHandle>;

type Step = Result<ControlFlow<()>, NegotiationError>;

/// Collaborators shared by every link of one session.
pub struct LinkEnv {
    pub signals: Arc<dyn SignalSink>,
    pub observer: Arc<dyn SessionObserver>,
    pub factory: Arc<dyn TransportFactory>,
    pub links: Arc<LinkTable>,
}

pub struct LinkSetup {
    pub remote: ParticipantId,
    pub role: NegotiationRole,
    pub generation: u64,
    pub ice_servers: Vec<IceServerConfig>,
    /// Tracks to send; `None` on the viewer side.
    pub media: Option<Arc<LocalMedia>>,
}

/// Session-side handle to a running [`PeerLink`].
#[derive(Clone)]
pub struct LinkHandle {
    tx: mpsc::UnboundedSender<LinkCommand>,
    state_rx: watch::Receiver<NegotiationState>,
    generation: u64,
    role: NegotiationRole,
}

impl LinkHandle {
    /// Queues a command; `false` if the link task is gone.
    pub fn send(&self, cmd: LinkCommand) -> bool {
        self.tx.send(cmd).is_ok()
    }

    pub fn state(&self) -> NegotiationState {
        *self.state_rx.borrow()
    }

    pub fn role(&self) -> NegotiationRole {
        self.role
    }

    pub fn is_live(&self) -> bool {
        !self.tx.is_closed() && !self.state().is_closed()
    }

    /// Resolves once the link has reached `Closed`.
    pub async fn closed(&self) {
        let mut rx = self.state_rx.clone();
        let _ = rx.wait_for(|state| state.is_closed()).await;
    }
}

/// Negotiation actor for one remote participant.
///
/// Commands from the session and events from the transport are handled one at
/// a time, so a link never has two negotiation steps in flight. Any error
/// closes this link only.
pub struct PeerLink {
    remote: ParticipantId,
    role: NegotiationRole,
    generation: u64,
    env: Arc<LinkEnv>,
    media: Option<Arc<LocalMedia>>,
    transport: Box<dyn PeerTransport>,
    command_rx: mpsc::UnboundedReceiver<LinkCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    state_tx: watch::Sender<NegotiationState>,
    pending_candidates: Vec<IceCandidate>,
    has_remote_description: bool,
    tracks_attached: bool,
    transport_connected: bool,
    announced: bool,
}

impl PeerLink {
    /// Starts the link task and returns its handle.
    ///
    /// Only channel setup happens here; the transport is created inside the
    /// task, and commands sent meanwhile wait in the mailbox.
    pub fn spawn(setup: LinkSetup, env: Arc<LinkEnv>) -> LinkHandle {
        let (tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(NegotiationState::Idle);

        let handle = LinkHandle {
            tx,
            state_rx,
            generation: setup.generation,
            role: setup.role,
        };

        tokio::spawn(Self::open(setup, env, command_rx, state_tx));
        handle
    }

    async fn open(
        setup: LinkSetup,
        env: Arc<LinkEnv>,
        command_rx: mpsc::UnboundedReceiver<LinkCommand>,
        state_tx: watch::Sender<NegotiationState>,
    ) {
        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_EVENT_CAPACITY);

        let transport = match env
            .factory
            .create(&setup.remote, &setup.ice_servers, transport_tx)
            .await
        {
            Ok(transport) => transport,
            Err(e) => {
                error!("Failed to create transport for {}: {:#}", setup.remote, e);
                let error = NegotiationError::Transport(e);
                env.observer
                    .on_negotiation_aborted(setup.remote.clone(), &error)
                    .await;
                state_tx.send_replace(NegotiationState::Closed);
                detach(&env, &setup.remote, setup.generation).await;
                return;
            }
        };

        let link = PeerLink {
            remote: setup.remote,
            role: setup.role,
            generation: setup.generation,
            env,
            media: setup.media,
            transport,
            command_rx,
            transport_rx,
            state_tx,
            pending_candidates: Vec::new(),
            has_remote_description: false,
            tracks_attached: false,
            transport_connected: false,
            announced: false,
        };
        link.run().await;
    }

    async fn run(mut self) {
        debug!("Link to {} started as {:?}", self.remote, self.role);

        // Whatever was queued while the transport was being created goes first,
        // so a link closed in the meantime never sends its offer.
        let mut outcome = self.handle_queued().await;
        if self.role == NegotiationRole::Offerer
            && self.state() == NegotiationState::Idle
            && matches!(outcome, Ok(ControlFlow::Continue(())))
        {
            outcome = self.send_offer().await.map(ControlFlow::Continue);
        }

        while let Ok(ControlFlow::Continue(())) = outcome {
            outcome = tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => Ok(ControlFlow::Break(())),
                },

                evt = self.transport_rx.recv() => match evt {
                    Some(evt) => self.handle_transport_event(evt).await,
                    None => {
                        warn!("Transport channel for {} closed unexpectedly", self.remote);
                        Ok(ControlFlow::Break(()))
                    }
                },
            };
        }

        if let Err(e) = outcome {
            warn!("Closing link to {}: {}", self.remote, e);
            self.env
                .observer
                .on_negotiation_aborted(self.remote.clone(), &e)
                .await;
        }

        self.shutdown().await;
    }

    async fn handle_command(&mut self, cmd: LinkCommand) -> Step {
        debug!("Link to {} handles '{}' in {}", self.remote, cmd.name(), self.state());

        match cmd {
            LinkCommand::RemoteOffer(sdp) => self.accept_offer(sdp).await?,
            LinkCommand::RemoteAnswer(sdp) => self.accept_answer(sdp).await?,
            LinkCommand::RemoteCandidate(candidate) => self.accept_candidate(candidate).await?,
            LinkCommand::Close => return Ok(ControlFlow::Break(())),
        }

        Ok(ControlFlow::Continue(()))
    }

    async fn handle_queued(&mut self) -> Step {
        while let Ok(cmd) = self.command_rx.try_recv() {
            if self.handle_command(cmd).await?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) -> Step {
        match event {
            TransportEvent::CandidateGenerated(candidate) => {
                self.env.signals.send(ClientSignal::IceCandidate {
                    target: self.remote.clone(),
                    candidate,
                });
            }

            TransportEvent::ConnectivityChanged(Connectivity::Connected) => {
                if matches!(
                    self.state(),
                    NegotiationState::Idle | NegotiationState::OfferSent
                ) {
                    debug!("Ignoring early connectivity report for {}", self.remote);
                } else {
                    self.transport_connected = true;
                    self.check_connected().await;
                }
            }

            TransportEvent::ConnectivityChanged(connectivity) if connectivity.is_lost() => {
                info!("Transport to {} lost ({:?})", self.remote, connectivity);
                return Ok(ControlFlow::Break(()));
            }

            TransportEvent::ConnectivityChanged(_) => {}

            TransportEvent::TrackReceived(track) => {
                self.env
                    .observer
                    .on_stream_attached(self.remote.clone(), track)
                    .await;
            }
        }

        Ok(ControlFlow::Continue(()))
    }

    async fn send_offer(&mut self) -> Result<(), NegotiationError> {
        self.attach_tracks().await?;

        let sdp = self.transport.create_offer().await?;
        self.set_state(NegotiationState::OfferSent);
        self.env.signals.send(ClientSignal::Offer {
            target: self.remote.clone(),
            sdp,
        });

        info!("Sent offer to {}", self.remote);
        Ok(())
    }

    async fn accept_offer(&mut self, sdp: String) -> Result<(), NegotiationError> {
        let state = self.state();
        if !state.accepts_offer() {
            return Err(NegotiationError::UnexpectedSignal {
                state,
                signal: "offer",
            });
        }

        self.set_state(NegotiationState::OfferReceived);
        self.transport.set_remote_offer(sdp).await?;
        self.has_remote_description = true;
        self.flush_candidates().await?;

        self.attach_tracks().await?;
        let answer = self.transport.create_answer().await?;
        self.set_state(NegotiationState::AnswerSent);
        self.env.signals.send(ClientSignal::Answer {
            target: self.remote.clone(),
            sdp: answer,
        });
        info!("Sent answer to {}", self.remote);

        self.check_connected().await;
        Ok(())
    }

    async fn accept_answer(&mut self, sdp: String) -> Result<(), NegotiationError> {
        let state = self.state();
        if !state.accepts_answer() {
            return Err(NegotiationError::UnexpectedSignal {
                state,
                signal: "answer",
            });
        }

        self.transport.set_remote_answer(sdp).await?;
        self.has_remote_description = true;
        self.set_state(NegotiationState::AnswerReceived);
        self.flush_candidates().await?;

        self.check_connected().await;
        Ok(())
    }

    async fn accept_candidate(&mut self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        if self.has_remote_description {
            self.transport.add_ice_candidate(candidate).await?;
        } else {
            debug!("Buffering candidate from {} until its description arrives", self.remote);
            self.pending_candidates.push(candidate);
        }
        Ok(())
    }

    async fn flush_candidates(&mut self) -> Result<(), NegotiationError> {
        for candidate in std::mem::take(&mut self.pending_candidates) {
            self.transport.add_ice_candidate(candidate).await?;
        }
        Ok(())
    }

    async fn attach_tracks(&mut self) -> Result<(), NegotiationError> {
        if self.tracks_attached {
            return Ok(());
        }
        let Some(media) = self.media.clone() else {
            return Ok(());
        };

        let tracks = media.tracks().await?;
        self.transport.add_tracks(&tracks).await?;
        self.tracks_attached = true;
        Ok(())
    }

    async fn check_connected(&mut self) {
        if !self.transport_connected || !self.state().awaits_connectivity() {
            return;
        }

        self.set_state(NegotiationState::Connected);
        if !self.announced {
            self.announced = true;
            self.env.observer.on_peer_connected(self.remote.clone()).await;
        }
    }

    async fn shutdown(mut self) {
        // Handles report the link as dead from here on.
        self.command_rx.close();
        self.pending_candidates.clear();

        if let Err(e) = self.transport.close().await {
            warn!("Failed to close transport for {}: {:#}", self.remote, e);
        }

        self.set_state(NegotiationState::Closed);
        detach(&self.env, &self.remote, self.generation).await;
    }

    fn state(&self) -> NegotiationState {
        *self.state_tx.borrow()
    }

    fn set_state(&self, state: NegotiationState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!("Link to {}: {} -> {}", self.remote, previous, state);
        }
    }
}

/// Drops the table entry, unless it already belongs to a newer link.
async fn detach(env: &LinkEnv, remote: &ParticipantId, generation: u64) {
    env.links
        .remove_if(remote, |_, handle| handle.generation == generation);
    env.observer.on_peer_closed(remote.clone()).await;
}
