pub use parley_core::model::{IceCandidate, RoomId, SessionDescription};

pub mod model {
    pub use parley_core::model::*;
}

pub mod error {
    pub use parley_core::error::*;
}

#[cfg(feature = "session")]
pub mod session {
    pub use parley_session::*;
}
