use parley_core::IceCandidate;

/// Candidates held back until the description they belong to is in place.
/// Remote candidates wait for the remote description, which the engine needs
/// before it accepts them. Local candidates wait until the local description
/// is published, because publishing an offer resets the room.
///
/// No deduplication: the ICE agent ignores a candidate it already knows.
#[derive(Debug, Default)]
pub struct IceCandidateQueue {
    pending: Vec<IceCandidate>,
}

impl IceCandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, candidate: IceCandidate) {
        self.pending.push(candidate);
    }

    /// Hands out every queued candidate in arrival order and empties the
    /// queue, but only once `ready` holds.
    pub fn drain_if_ready(&mut self, ready: bool) -> Vec<IceCandidate> {
        if !ready {
            return Vec::new();
        }
        std::mem::take(&mut self.pending)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
