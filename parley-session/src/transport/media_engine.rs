use anyhow::Result;
use async_trait::async_trait;
use parley_core::{IceCandidate, SessionDescription};

/// The peer-connection operations negotiation needs. Implemented over
/// webrtc-rs by [`crate::RtcMediaEngine`]; tests plug in recording fakes.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Create the local audio/video tracks and add them to the connection.
    /// Calling it again once tracks exist does nothing.
    async fn attach_local_tracks(&self) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: &SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: &SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<()>;

    /// Release local tracks and close the connection.
    async fn close(&self) -> Result<()>;
}
