use parley_core::{IceCandidate, PeerConnectionState, RemoteTrack};

/// Events the media engine raises on its own threads. They are forwarded into
/// the call session inbox and never touch negotiation state directly.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A local ICE candidate was gathered and should be sent to the peer.
    LocalCandidate(IceCandidate),

    /// The remote peer started sending a track.
    RemoteTrack(RemoteTrack),

    /// Transport state of the peer connection changed.
    ConnectionState(PeerConnectionState),
}
