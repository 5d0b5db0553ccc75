use crate::negotiation::{Effect, EngineCompletion, EngineOutcome, NegotiationStateMachine};
use crate::session::{
    CallHandle, PublishCompletion, SessionCommand, SessionConfig, SessionEvent, SessionSnapshot,
};
use crate::signaling::{SignalingChannel, Subscription};
use crate::transport::{EngineEvent, EngineWorker, MediaEngine, RtcMediaEngine};
use parley_core::{
    CallError, CandidateField, ChannelError, ChannelEvent, IceCandidate, NegotiationState, RoomId,
    SdpKind, SessionDescription, SessionError,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Actor owning one call: the negotiation state machine, the media engine
/// and the room subscription.
///
/// Handle commands, engine events, channel events and the completions of
/// engine and publish operations all arrive on channels consumed by the
/// single `run` loop, so negotiation state is only ever touched from here.
pub struct CallSession {
    room: RoomId,
    machine: NegotiationStateMachine,
    channel: Arc<dyn SignalingChannel>,
    engine: Arc<dyn MediaEngine>,
    worker: EngineWorker,
    subscription: Option<Subscription>,
    pending_offer: Option<oneshot::Sender<Result<(), CallError>>>,

    command_rx: mpsc::Receiver<SessionCommand>,
    engine_rx: mpsc::Receiver<EngineEvent>,
    completion_rx: mpsc::UnboundedReceiver<EngineCompletion>,
    channel_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    channel_tx: mpsc::UnboundedSender<ChannelEvent>,
    publish_rx: mpsc::UnboundedReceiver<PublishCompletion>,
    publish_tx: mpsc::UnboundedSender<PublishCompletion>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl CallSession {
    /// Starts a session for the channel's room on the current runtime.
    /// `engine_events` must be the receiving end of the sender the engine
    /// was built with.
    pub fn spawn(
        channel: Arc<dyn SignalingChannel>,
        engine: Arc<dyn MediaEngine>,
        engine_events: mpsc::Receiver<EngineEvent>,
        config: &SessionConfig,
    ) -> (CallHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let room = channel.room().clone();
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (channel_tx, channel_rx) = mpsc::unbounded_channel();
        let (publish_tx, publish_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let session = Self {
            room: room.clone(),
            machine: NegotiationStateMachine::new(config.attach_local_media),
            channel,
            worker: EngineWorker::spawn(engine.clone(), completion_tx),
            engine,
            subscription: None,
            pending_offer: None,
            command_rx,
            engine_rx: engine_events,
            completion_rx,
            channel_rx,
            channel_tx,
            publish_rx,
            publish_tx,
            event_tx,
        };
        tokio::spawn(session.run());

        (CallHandle::new(room, command_tx), event_rx)
    }

    /// Builds a webrtc-rs engine from `config` and starts a session on it.
    /// The engine is returned as well so capture code can reach the local
    /// tracks.
    pub async fn spawn_rtc(
        channel: Arc<dyn SignalingChannel>,
        config: &SessionConfig,
    ) -> anyhow::Result<(
        CallHandle,
        mpsc::UnboundedReceiver<SessionEvent>,
        Arc<RtcMediaEngine>,
    )> {
        let (engine_tx, engine_rx) = mpsc::channel(config.engine_event_buffer.max(1));
        let engine = Arc::new(RtcMediaEngine::new(config, engine_tx).await?);
        let (handle, events) = Self::spawn(channel, engine.clone(), engine_rx, config);
        Ok((handle, events, engine))
    }

    pub async fn run(mut self) {
        info!("Call session for room {} started", self.room);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All handles dropped. Disposing session for room {}.", self.room);
                            break;
                        }
                    }
                }

                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion).await;
                }

                Some(done) = self.publish_rx.recv() => {
                    self.handle_publish_completion(done).await;
                }

                Some(event) = self.channel_rx.recv() => {
                    self.handle_channel_event(event).await;
                }

                Some(event) = self.engine_rx.recv() => {
                    self.handle_engine_event(event).await;
                }
            }
        }

        let effects = self.machine.hangup();
        self.apply(effects).await;
        info!("Call session for room {} finished", self.room);
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::CreateOffer { reply } => {
                if self.machine.is_closed() {
                    let _ = reply.send(Err(SessionError::Closed.into()));
                    return;
                }

                let fresh = self.subscription.is_none();
                if fresh {
                    match self.subscribe(CandidateField::AnswerCandidates) {
                        Ok(sub) => self.subscription = Some(sub),
                        Err(e) => {
                            warn!("Cannot listen on room {}: {}", self.room, e);
                            let _ = reply.send(Err(e.into()));
                            return;
                        }
                    }
                }

                match self.machine.create_offer() {
                    Ok(effects) => {
                        self.pending_offer = Some(reply);
                        self.apply(effects).await;
                    }
                    Err(e) => {
                        if fresh {
                            self.subscription = None;
                        }
                        let _ = reply.send(Err(e.into()));
                    }
                }
            }

            SessionCommand::AnswerCall { room, reply } => {
                if room != self.room {
                    let _ = reply.send(Err(SessionError::RoomAlreadyBound {
                        bound: self.room.clone(),
                        requested: room,
                    }
                    .into()));
                    return;
                }
                if self.machine.is_closed() {
                    let _ = reply.send(Err(SessionError::Closed.into()));
                    return;
                }

                // (Re)arming replays the document, so an offer that is
                // already stored is picked up.
                let rearm = matches!(
                    self.machine.state(),
                    NegotiationState::Idle | NegotiationState::AwaitingOffer
                );
                let fresh = if rearm {
                    match self.subscribe(CandidateField::OfferCandidates) {
                        Ok(sub) => Some(sub),
                        Err(e) => {
                            warn!("Cannot listen on room {}: {}", self.room, e);
                            let _ = reply.send(Err(e.into()));
                            return;
                        }
                    }
                } else {
                    None
                };

                match self.machine.arm_callee() {
                    Ok(effects) => {
                        if let Some(sub) = fresh {
                            self.subscription = Some(sub);
                        }
                        info!("Waiting for an offer in room {}", self.room);
                        self.apply(effects).await;
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e.into()));
                    }
                }
            }

            SessionCommand::Hangup { reply } => {
                let effects = self.machine.hangup();
                self.apply(effects).await;
                let _ = reply.send(());
            }

            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(SessionSnapshot {
                    state: self.machine.state(),
                    role: self.machine.role(),
                    round: self.machine.round(),
                    pending_candidates: self.machine.pending_candidates(),
                });
            }
        }
    }

    async fn handle_channel_event(&mut self, event: ChannelEvent) {
        let effects = match event {
            ChannelEvent::OfferChanged(offer) => self.machine.receive_offer(offer),
            ChannelEvent::AnswerChanged(answer) => self.machine.receive_answer(answer),
            ChannelEvent::IceCandidateAdded(candidate) => {
                self.machine.receive_ice_candidate(candidate)
            }
        };
        self.apply(effects).await;
    }

    async fn handle_completion(&mut self, completion: EngineCompletion) {
        let EngineCompletion { round, outcome } = completion;
        let effects = match outcome {
            EngineOutcome::LocalTracksAttached(r) => self.machine.on_local_tracks_attached(round, r),
            EngineOutcome::OfferCreated(r) => self.machine.on_offer_created(round, r),
            EngineOutcome::AnswerCreated(r) => self.machine.on_answer_created(round, r),
            EngineOutcome::LocalDescriptionSet(r) => self.machine.on_local_description_set(round, r),
            EngineOutcome::RemoteDescriptionSet(r) => {
                self.machine.on_remote_description_set(round, r)
            }
            EngineOutcome::IceCandidateAdded(r) => self.machine.on_ice_candidate_added(round, r),
        };
        self.apply(effects).await;
    }

    async fn handle_publish_completion(&mut self, done: PublishCompletion) {
        match done {
            PublishCompletion::Description {
                round,
                kind,
                result,
            } => {
                let effects = self.machine.on_published(round, kind, result);
                self.apply(effects).await;
            }
            PublishCompletion::Candidate { result } => {
                let Err(e) = result else {
                    return;
                };
                if self.machine.is_closed() {
                    return;
                }
                warn!("Failed to publish local candidate: {}", e);
                self.emit(SessionEvent::Failed(e.into()));
            }
        }
    }

    async fn handle_engine_event(&mut self, event: EngineEvent) {
        if self.machine.is_closed() {
            debug!("Engine event after close ignored: {:?}", event);
            return;
        }

        match event {
            EngineEvent::LocalCandidate(candidate) => {
                let effects = self.machine.receive_local_candidate(candidate);
                self.apply(effects).await;
            }

            EngineEvent::RemoteTrack(track) => {
                info!("Remote {:?} track {} added", track.kind, track.id);
                self.emit(SessionEvent::RemoteTrackAdded(track));
            }

            EngineEvent::ConnectionState(state) => {
                self.emit(SessionEvent::ConnectionStateChanged(state));
            }
        }
    }

    async fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Engine { round, op } => self.worker.submit(round, op),

                Effect::Publish { round, desc } => self.publish(round, desc),

                Effect::PublishCandidate { field, candidate } => {
                    self.publish_candidate(field, candidate)
                }

                Effect::Emit(event) => self.emit(event),

                Effect::ResolveOffer(result) => {
                    let Some(reply) = self.pending_offer.take() else {
                        continue;
                    };
                    let _ = reply.send(result);
                }

                Effect::Release => self.release().await,
            }
        }
    }

    fn publish(&self, round: u64, desc: SessionDescription) {
        let channel = self.channel.clone();
        let tx = self.publish_tx.clone();

        tokio::spawn(async move {
            let kind = desc.kind();
            let result = match kind {
                SdpKind::Offer => channel.publish_offer(&desc).await,
                SdpKind::Answer => channel.publish_answer(&desc).await,
            };
            let _ = tx.send(PublishCompletion::Description {
                round,
                kind,
                result,
            });
        });
    }

    fn publish_candidate(&self, field: CandidateField, candidate: IceCandidate) {
        let channel = self.channel.clone();
        let tx = self.publish_tx.clone();

        tokio::spawn(async move {
            let result = channel.publish_ice_candidate(field, &candidate).await;
            let _ = tx.send(PublishCompletion::Candidate { result });
        });
    }

    async fn release(&mut self) {
        info!("Releasing call resources for room {}", self.room);

        self.worker.shutdown();

        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }

        if let Some(reply) = self.pending_offer.take() {
            let _ = reply.send(Err(SessionError::Closed.into()));
        }

        if let Err(e) = self.engine.close().await {
            error!("Teardown error in room {}: {:#}", self.room, e);
        }
    }

    fn subscribe(&self, remote_candidates: CandidateField) -> Result<Subscription, ChannelError> {
        self.channel
            .subscribe(remote_candidates, self.channel_tx.clone())
    }

    fn emit(&self, event: SessionEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("Session event dropped: no listener");
        }
    }
}
