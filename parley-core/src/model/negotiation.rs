use crate::model::signaling::CandidateField;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
pub enum NegotiationRole {
    #[default]
    Unset,
    Caller,
    Callee,
}

impl NegotiationRole {
    /// Candidate collection this side writes its own candidates to.
    pub fn local_candidates(&self) -> Option<CandidateField> {
        match self {
            NegotiationRole::Caller => Some(CandidateField::OfferCandidates),
            NegotiationRole::Callee => Some(CandidateField::AnswerCandidates),
            NegotiationRole::Unset => None,
        }
    }

    /// Candidate collection the remote side writes to.
    pub fn remote_candidates(&self) -> Option<CandidateField> {
        self.local_candidates().map(|field| field.opposite())
    }
}

/// Progress of one offer/answer exchange.
///
/// Caller: `Idle -> RoleAssigned -> OfferCreated -> LocalDescriptionSet ->
/// RemoteDescriptionPending -> Negotiated`.
///
/// Callee: `Idle -> AwaitingOffer -> RemoteDescriptionPending -> RoleAssigned
/// -> AnswerCreated -> LocalDescriptionSet -> Negotiated`.
///
/// Any state moves to `Closed` on hangup.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
pub enum NegotiationState {
    #[default]
    Idle,
    AwaitingOffer,
    RoleAssigned,
    OfferCreated,
    AnswerCreated,
    LocalDescriptionSet,
    RemoteDescriptionPending,
    Negotiated,
    Closed,
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
