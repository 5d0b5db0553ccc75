mod memory_store;
mod signaling_channel;
mod subscription;

pub use memory_store::*;
pub use signaling_channel::*;
pub use subscription::*;
