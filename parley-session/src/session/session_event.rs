use parley_core::{
    CallError, NegotiationState, PeerConnectionState, RemoteTrack, SessionDescription,
};

/// Notifications for the UI layer, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Local audio/video tracks exist; the preview surface can attach.
    LocalTracksReady,

    /// Our offer is set locally and stored in the room.
    LocalOfferReady(SessionDescription),

    /// Our answer is set locally and stored in the room.
    LocalAnswerReady(SessionDescription),

    RemoteTrackAdded(RemoteTrack),

    ConnectionStateChanged(PeerConnectionState),

    NegotiationStateChanged(NegotiationState),

    /// An asynchronous step failed with no caller waiting on it.
    Failed(CallError),

    SessionClosed,
}
