use crate::model::{NegotiationState, RoomId};
use thiserror::Error;

/// SDP creation or description application failed inside the media engine.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum NegotiationError {
    #[error("failed to create offer: {0}")]
    OfferCreationFailed(String),

    #[error("failed to create answer: {0}")]
    AnswerCreationFailed(String),

    #[error("failed to set local description: {0}")]
    LocalDescriptionFailed(String),

    #[error("failed to set remote description: {0}")]
    RemoteDescriptionFailed(String),
}

/// Publishing to or subscribing on the signaling store failed.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ChannelError {
    #[error("signaling store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed signaling record: {0}")]
    Malformed(String),

    #[error("signaling channel closed")]
    Closed,
}

/// The caller asked for something the session cannot do right now.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum SessionError {
    #[error("session is bound to room {bound}, not {requested}")]
    RoomAlreadyBound { bound: RoomId, requested: RoomId },

    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: NegotiationState,
    },

    #[error("invalid room id {0:?}")]
    InvalidRoom(String),

    #[error("session closed")]
    Closed,
}

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum CallError {
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
