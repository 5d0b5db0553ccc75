use parley_core::{CallError, ChannelError, NegotiationRole, NegotiationState, RoomId, SdpKind};
use tokio::sync::oneshot;

/// Requests from a `CallHandle` to the session actor.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    CreateOffer {
        reply: oneshot::Sender<Result<(), CallError>>,
    },

    AnswerCall {
        room: RoomId,
        reply: oneshot::Sender<Result<(), CallError>>,
    },

    Hangup {
        reply: oneshot::Sender<()>,
    },

    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Completion of a write to the signaling channel.
#[derive(Debug)]
pub(crate) enum PublishCompletion {
    Description {
        round: u64,
        kind: SdpKind,
        result: Result<(), ChannelError>,
    },
    Candidate {
        result: Result<(), ChannelError>,
    },
}

/// Point-in-time view of a session's negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: NegotiationState,
    pub role: NegotiationRole,
    pub round: u64,
    pub pending_candidates: usize,
}
