use crate::negotiation::{Effect, EngineOp, IceCandidateQueue};
use crate::session::SessionEvent;
use parley_core::{
    CallError, ChannelError, IceCandidate, NegotiationError, NegotiationRole, NegotiationState,
    SdpKind, SessionDescription, SessionError,
};
use tracing::{debug, info, warn};

/// Offer/answer negotiation for one call.
///
/// The machine never talks to the engine or the channel itself. Every input
/// (a user action, a channel event, the completion of an earlier engine or
/// publish operation) returns the effects the session has to carry out.
/// Completions are tagged with the round they were issued in; a completion
/// from an older round, or any input after `Closed`, is dropped.
#[derive(Debug)]
pub struct NegotiationStateMachine {
    state: NegotiationState,
    role: NegotiationRole,
    round: u64,
    attach_local_media: bool,
    /// Round in which a remote description was accepted for application.
    remote_round: Option<u64>,
    /// The connection acknowledged the remote description of this round.
    remote_applied: bool,
    local_description: Option<SessionDescription>,
    published: bool,
    pending_candidates: IceCandidateQueue,
    /// Local candidates gathered before our description reached the room.
    local_candidates: IceCandidateQueue,
}

impl NegotiationStateMachine {
    pub fn new(attach_local_media: bool) -> Self {
        Self {
            state: NegotiationState::Idle,
            role: NegotiationRole::Unset,
            round: 0,
            attach_local_media,
            remote_round: None,
            remote_applied: false,
            local_description: None,
            published: false,
            pending_candidates: IceCandidateQueue::new(),
            local_candidates: IceCandidateQueue::new(),
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn role(&self) -> NegotiationRole {
        self.role
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state == NegotiationState::Closed
    }

    // ---- local actions ----

    pub fn create_offer(&mut self) -> Result<Vec<Effect>, SessionError> {
        let mut effects = Vec::new();
        match (self.state, self.role) {
            (NegotiationState::Closed, _) => return Err(SessionError::Closed),
            (NegotiationState::Idle, NegotiationRole::Unset) => {
                self.start_round(NegotiationRole::Caller);
                self.transition(NegotiationState::RoleAssigned, &mut effects);
                self.attach_tracks(&mut effects);
                effects.push(self.engine(EngineOp::CreateOffer));
            }
            (NegotiationState::LocalDescriptionSet, NegotiationRole::Caller) if !self.published => {
                info!("Retrying offer publication (round {})", self.round);
                effects.extend(self.republish());
            }
            (state, _) => {
                return Err(SessionError::InvalidState {
                    action: "create offer",
                    state,
                });
            }
        }
        Ok(effects)
    }

    /// Puts the session in the callee position: listeners are armed and the
    /// next offer assigns the `Callee` role.
    pub fn arm_callee(&mut self) -> Result<Vec<Effect>, SessionError> {
        let mut effects = Vec::new();
        match (self.state, self.role) {
            (NegotiationState::Closed, _) => return Err(SessionError::Closed),
            (NegotiationState::Idle, NegotiationRole::Unset) => {
                self.transition(NegotiationState::AwaitingOffer, &mut effects);
            }
            (NegotiationState::AwaitingOffer, _) => {}
            (NegotiationState::LocalDescriptionSet, NegotiationRole::Callee) if !self.published => {
                info!("Retrying answer publication (round {})", self.round);
                effects.extend(self.republish());
            }
            (state, _) => {
                return Err(SessionError::InvalidState {
                    action: "answer call",
                    state,
                });
            }
        }
        Ok(effects)
    }

    pub fn hangup(&mut self) -> Vec<Effect> {
        if self.is_closed() {
            debug!("Hangup on a closed session ignored");
            return Vec::new();
        }

        let mut effects = Vec::new();
        self.pending_candidates.clear();
        self.local_candidates.clear();
        self.local_description = None;
        self.transition(NegotiationState::Closed, &mut effects);
        effects.push(Effect::Release);
        effects.push(Effect::Emit(SessionEvent::SessionClosed));
        effects
    }

    // ---- channel events ----

    pub fn receive_offer(&mut self, offer: SessionDescription) -> Vec<Effect> {
        if self.is_closed() {
            return Vec::new();
        }
        if self.role != NegotiationRole::Unset {
            debug!("Ignoring offer: role is already {:?}", self.role);
            return Vec::new();
        }
        if !matches!(
            self.state,
            NegotiationState::Idle | NegotiationState::AwaitingOffer
        ) {
            debug!("Ignoring offer in state {}", self.state);
            return Vec::new();
        }

        let mut effects = Vec::new();
        self.start_round(NegotiationRole::Callee);
        self.remote_round = Some(self.round);
        info!("Offer received, answering as callee (round {})", self.round);
        self.transition(NegotiationState::RemoteDescriptionPending, &mut effects);
        self.attach_tracks(&mut effects);
        effects.push(self.engine(EngineOp::SetRemoteDescription(offer)));
        effects
    }

    pub fn receive_answer(&mut self, answer: SessionDescription) -> Vec<Effect> {
        if self.is_closed() {
            return Vec::new();
        }
        if self.role != NegotiationRole::Caller {
            debug!("Ignoring answer: role is {:?}", self.role);
            return Vec::new();
        }
        if self.remote_round == Some(self.round) {
            debug!("Ignoring duplicate answer for round {}", self.round);
            return Vec::new();
        }
        if self.state != NegotiationState::LocalDescriptionSet {
            debug!("Ignoring answer in state {}", self.state);
            return Vec::new();
        }

        let mut effects = Vec::new();
        self.remote_round = Some(self.round);
        self.transition(NegotiationState::RemoteDescriptionPending, &mut effects);
        effects.push(self.engine(EngineOp::SetRemoteDescription(answer)));
        effects
    }

    pub fn receive_ice_candidate(&mut self, candidate: IceCandidate) -> Vec<Effect> {
        if self.is_closed() {
            return Vec::new();
        }
        if self.remote_applied {
            return vec![self.engine(EngineOp::AddIceCandidate(candidate))];
        }

        self.pending_candidates.enqueue(candidate);
        debug!(
            "Queued remote candidate until remote description is set ({} pending)",
            self.pending_candidates.len()
        );
        Vec::new()
    }

    // ---- engine events ----

    /// A candidate gathered by the local engine. It is published only after
    /// the local description is in the room; earlier ones are held.
    pub fn receive_local_candidate(&mut self, candidate: IceCandidate) -> Vec<Effect> {
        if self.is_closed() {
            return Vec::new();
        }
        let Some(field) = self.role.local_candidates() else {
            warn!("Local candidate gathered before a role was assigned, dropping");
            return Vec::new();
        };
        if self.published {
            return vec![Effect::PublishCandidate { field, candidate }];
        }

        self.local_candidates.enqueue(candidate);
        debug!(
            "Holding local candidate until the {} is published ({} held)",
            if self.role == NegotiationRole::Caller { "offer" } else { "answer" },
            self.local_candidates.len()
        );
        Vec::new()
    }

    // ---- completions ----

    pub fn on_local_tracks_attached(&mut self, round: u64, result: Result<(), String>) -> Vec<Effect> {
        if self.is_stale(round) {
            return Vec::new();
        }
        match result {
            Ok(()) => vec![Effect::Emit(SessionEvent::LocalTracksReady)],
            Err(e) => {
                warn!("Local media unavailable, continuing receive-only: {}", e);
                Vec::new()
            }
        }
    }

    pub fn on_offer_created(
        &mut self,
        round: u64,
        result: Result<SessionDescription, String>,
    ) -> Vec<Effect> {
        if self.is_stale(round)
            || self.role != NegotiationRole::Caller
            || self.state != NegotiationState::RoleAssigned
        {
            return Vec::new();
        }

        let mut effects = Vec::new();
        match result {
            Ok(offer) => {
                self.local_description = Some(offer.clone());
                self.transition(NegotiationState::OfferCreated, &mut effects);
                effects.push(self.engine(EngineOp::SetLocalDescription(offer)));
            }
            Err(e) => {
                warn!("Offer creation failed: {}", e);
                self.reset_to(NegotiationState::Idle, &mut effects);
                effects.push(Effect::ResolveOffer(Err(
                    NegotiationError::OfferCreationFailed(e).into(),
                )));
            }
        }
        effects
    }

    pub fn on_answer_created(
        &mut self,
        round: u64,
        result: Result<SessionDescription, String>,
    ) -> Vec<Effect> {
        if self.is_stale(round)
            || self.role != NegotiationRole::Callee
            || self.state != NegotiationState::RoleAssigned
        {
            return Vec::new();
        }

        let mut effects = Vec::new();
        match result {
            Ok(answer) => {
                self.local_description = Some(answer.clone());
                self.transition(NegotiationState::AnswerCreated, &mut effects);
                effects.push(self.engine(EngineOp::SetLocalDescription(answer)));
            }
            Err(e) => {
                warn!("Answer creation failed: {}", e);
                self.reset_to(NegotiationState::AwaitingOffer, &mut effects);
                effects.push(failed(NegotiationError::AnswerCreationFailed(e)));
            }
        }
        effects
    }

    pub fn on_local_description_set(&mut self, round: u64, result: Result<(), String>) -> Vec<Effect> {
        if self.is_stale(round)
            || !matches!(
                self.state,
                NegotiationState::OfferCreated | NegotiationState::AnswerCreated
            )
        {
            return Vec::new();
        }

        let mut effects = Vec::new();
        match (result, self.local_description.clone()) {
            (Ok(()), Some(local)) => {
                self.transition(NegotiationState::LocalDescriptionSet, &mut effects);
                effects.push(Effect::Publish {
                    round: self.round,
                    desc: local,
                });
            }
            (Ok(()), None) => {
                warn!("Local description acknowledged but none is held");
            }
            (Err(e), _) => {
                warn!("Setting local description failed: {}", e);
                let error = NegotiationError::LocalDescriptionFailed(e);
                if self.role == NegotiationRole::Caller {
                    self.reset_to(NegotiationState::Idle, &mut effects);
                    effects.push(Effect::ResolveOffer(Err(error.into())));
                } else {
                    self.reset_to(NegotiationState::AwaitingOffer, &mut effects);
                    effects.push(failed(error));
                }
            }
        }
        effects
    }

    pub fn on_remote_description_set(&mut self, round: u64, result: Result<(), String>) -> Vec<Effect> {
        if self.is_stale(round) || self.state != NegotiationState::RemoteDescriptionPending {
            return Vec::new();
        }

        let mut effects = Vec::new();
        match result {
            Ok(()) => {
                self.remote_applied = true;
                let next = match self.role {
                    NegotiationRole::Callee => NegotiationState::RoleAssigned,
                    _ => NegotiationState::Negotiated,
                };
                self.transition(next, &mut effects);

                let queued = self.pending_candidates.drain_if_ready(self.remote_applied);
                if !queued.is_empty() {
                    debug!("Applying {} queued remote candidates", queued.len());
                }
                for candidate in queued {
                    effects.push(self.engine(EngineOp::AddIceCandidate(candidate)));
                }

                if self.role == NegotiationRole::Callee {
                    effects.push(self.engine(EngineOp::CreateAnswer));
                }
            }
            Err(e) => {
                warn!("Setting remote description failed: {}", e);
                let error = NegotiationError::RemoteDescriptionFailed(e);
                if self.role == NegotiationRole::Caller {
                    // A redelivered answer may be applied again.
                    self.remote_round = None;
                    self.transition(NegotiationState::LocalDescriptionSet, &mut effects);
                } else {
                    self.reset_to(NegotiationState::AwaitingOffer, &mut effects);
                }
                effects.push(failed(error));
            }
        }
        effects
    }

    pub fn on_ice_candidate_added(&mut self, round: u64, result: Result<(), String>) -> Vec<Effect> {
        if self.is_stale(round) {
            return Vec::new();
        }
        if let Err(e) = result {
            warn!("Remote candidate rejected by engine: {}", e);
        }
        Vec::new()
    }

    pub fn on_published(
        &mut self,
        round: u64,
        kind: SdpKind,
        result: Result<(), ChannelError>,
    ) -> Vec<Effect> {
        if self.is_stale(round) {
            return Vec::new();
        }
        let Some(local) = self.local_description.clone() else {
            return Vec::new();
        };
        if local.kind() != kind || self.published {
            return Vec::new();
        }

        let mut effects = Vec::new();
        match (kind, result) {
            (SdpKind::Offer, Ok(())) => {
                self.published = true;
                info!("Offer published (round {})", self.round);
                effects.push(Effect::Emit(SessionEvent::LocalOfferReady(local)));
                effects.push(Effect::ResolveOffer(Ok(())));
                self.flush_local_candidates(&mut effects);
            }
            (SdpKind::Offer, Err(e)) => {
                warn!("Offer publication failed: {}", e);
                effects.push(Effect::ResolveOffer(Err(e.into())));
            }
            (SdpKind::Answer, Ok(())) => {
                self.published = true;
                info!("Answer published (round {})", self.round);
                if self.state == NegotiationState::LocalDescriptionSet {
                    self.transition(NegotiationState::Negotiated, &mut effects);
                }
                effects.push(Effect::Emit(SessionEvent::LocalAnswerReady(local)));
                self.flush_local_candidates(&mut effects);
            }
            (SdpKind::Answer, Err(e)) => {
                warn!("Answer publication failed: {}", e);
                effects.push(failed(e));
            }
        }
        effects
    }

    // ---- helpers ----

    fn is_stale(&self, round: u64) -> bool {
        if self.is_closed() {
            debug!("Completion after close ignored");
            return true;
        }
        if round != self.round {
            debug!("Completion for round {} ignored (now {})", round, self.round);
            return true;
        }
        false
    }

    fn start_round(&mut self, role: NegotiationRole) {
        self.round += 1;
        self.role = role;
        self.remote_round = None;
        self.remote_applied = false;
        self.local_description = None;
        self.published = false;
        self.local_candidates.clear();
    }

    /// Back to a stable state with no role, ready for the user to retry.
    /// Bumping the round turns every in-flight completion into a no-op.
    fn reset_to(&mut self, state: NegotiationState, effects: &mut Vec<Effect>) {
        self.round += 1;
        self.role = NegotiationRole::Unset;
        self.remote_round = None;
        self.remote_applied = false;
        self.local_description = None;
        self.published = false;
        self.pending_candidates.clear();
        self.local_candidates.clear();
        self.transition(state, effects);
    }

    fn transition(&mut self, next: NegotiationState, effects: &mut Vec<Effect>) {
        if self.state == next {
            return;
        }
        debug!("Negotiation {} -> {} (round {})", self.state, next, self.round);
        self.state = next;
        effects.push(Effect::Emit(SessionEvent::NegotiationStateChanged(next)));
    }

    fn flush_local_candidates(&mut self, effects: &mut Vec<Effect>) {
        let Some(field) = self.role.local_candidates() else {
            return;
        };
        for candidate in self.local_candidates.drain_if_ready(self.published) {
            effects.push(Effect::PublishCandidate { field, candidate });
        }
    }

    fn attach_tracks(&self, effects: &mut Vec<Effect>) {
        if self.attach_local_media {
            effects.push(self.engine(EngineOp::AttachLocalTracks));
        }
    }

    fn republish(&self) -> Vec<Effect> {
        self.local_description
            .clone()
            .map(|desc| Effect::Publish {
                round: self.round,
                desc,
            })
            .into_iter()
            .collect()
    }

    fn engine(&self, op: EngineOp) -> Effect {
        Effect::Engine {
            round: self.round,
            op,
        }
    }
}

fn failed(error: impl Into<CallError>) -> Effect {
    Effect::Emit(SessionEvent::Failed(error.into()))
}
