pub mod error;
pub mod model;

pub use error::{CallError, ChannelError, NegotiationError, SessionError};
pub use model::*;
