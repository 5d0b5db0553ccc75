use crate::signaling::Subscription;
use async_trait::async_trait;
use parley_core::{
    CandidateField, ChannelError, ChannelEvent, IceCandidate, RoomId, SessionDescription,
};
use tokio::sync::mpsc;

/// Trait implemented by the external signaling store (a document store, a
/// WebSocket relay, ...) so a call session can exchange SDP and ICE for one
/// room.
///
/// Delivery guarantees the session relies on:
/// * events of one field arrive in write order;
/// * events of different fields are not ordered relative to each other;
/// * the same write may be delivered more than once.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// The room this channel reads and writes.
    fn room(&self) -> &RoomId;

    /// Write the caller's offer, starting a fresh call document.
    async fn publish_offer(&self, offer: &SessionDescription) -> Result<(), ChannelError>;

    /// Write the callee's answer next to the existing offer.
    async fn publish_answer(&self, answer: &SessionDescription) -> Result<(), ChannelError>;

    /// Append a local candidate to the given collection.
    async fn publish_ice_candidate(
        &self,
        field: CandidateField,
        candidate: &IceCandidate,
    ) -> Result<(), ChannelError>;

    /// Start listening to the offer, the answer and the `remote_candidates`
    /// collection. The current document contents are delivered first.
    fn subscribe(
        &self,
        remote_candidates: CandidateField,
        sink: mpsc::UnboundedSender<ChannelEvent>,
    ) -> Result<Subscription, ChannelError>;
}
