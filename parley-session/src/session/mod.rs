mod call_handle;
mod call_session;
mod session_command;
mod session_config;
mod session_event;

pub use call_handle::*;
pub use call_session::*;
pub(crate) use session_command::*;
pub use session_command::SessionSnapshot;
pub use session_config::*;
pub use session_event::*;
