mod effect;
mod ice_queue;
mod state_machine;

pub use effect::*;
pub use ice_queue::*;
pub use state_machine::*;
