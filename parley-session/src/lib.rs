mod negotiation;
mod session;
mod signaling;
mod transport;

pub use negotiation::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
