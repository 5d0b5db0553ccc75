mod candidate;
mod description;
mod media;
mod negotiation;
mod room;
mod signaling;

pub use candidate::IceCandidate;
pub use description::{SdpKind, SessionDescription};
pub use media::{PeerConnectionState, RemoteTrack, TrackKind};
pub use negotiation::{NegotiationRole, NegotiationState};
pub use room::RoomId;
pub use signaling::{CandidateField, ChannelEvent, DescriptionRecord, IceServerConfig};
