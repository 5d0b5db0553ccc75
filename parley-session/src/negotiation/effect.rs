use crate::session::SessionEvent;
use parley_core::{CallError, CandidateField, IceCandidate, SessionDescription};

/// Peer-connection work requested by the state machine. Executed in order by
/// the engine worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOp {
    AttachLocalTracks,
    CreateOffer,
    CreateAnswer,
    SetLocalDescription(SessionDescription),
    SetRemoteDescription(SessionDescription),
    AddIceCandidate(IceCandidate),
}

/// Result of an `EngineOp`, fed back into the state machine. Errors carry
/// the rendered engine error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    LocalTracksAttached(Result<(), String>),
    OfferCreated(Result<SessionDescription, String>),
    AnswerCreated(Result<SessionDescription, String>),
    LocalDescriptionSet(Result<(), String>),
    RemoteDescriptionSet(Result<(), String>),
    IceCandidateAdded(Result<(), String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCompletion {
    pub round: u64,
    pub outcome: EngineOutcome,
}

/// What the session must do after the state machine handled an input.
/// Effects are executed in the order they are returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Engine { round: u64, op: EngineOp },
    Publish { round: u64, desc: SessionDescription },
    /// Append a local candidate to the role's collection in the room.
    PublishCandidate {
        field: CandidateField,
        candidate: IceCandidate,
    },
    Emit(SessionEvent),
    /// Settle the pending `create_offer` call, if any.
    ResolveOffer(Result<(), CallError>),
    /// Close the connection, drop local tracks and the subscription.
    Release,
}
